
use std::time::Duration;

use quiz_forge::clients::MockResponse;
use quiz_forge::config::QuizSettings;
use quiz_forge::error::{ContractViolation, QuizError};
use quiz_forge::locale::Locale;
use quiz_forge::quiz::Quiz;
use quiz_forge::{GenerationRequest, QuizKind, QuizSession, Truth};
use serde_json::json;

use crate::test_utils::*;

#[tokio::test]
async fn multiple_choice_quiz_matches_requested_count() {
    let (generator, handle) = mock_generator();
    handle.push(MockResponse::json(multiple_choice_reply(3)));

    let request = GenerationRequest::new(QuizKind::MultipleChoice, SOLAR_CONTEXT).with_question_count(3);
    let quiz = generator.generate(&request).await.unwrap();

    assert_eq!(quiz.kind(), QuizKind::MultipleChoice);
    assert_eq!(quiz.len(), 3);
    assert_eq!(quiz.title(), Some("Solar System"));
    match &quiz {
        Quiz::MultipleChoice { questions, .. } => {
            for question in questions {
                assert_eq!(question.options.len(), 3);
                assert_eq!(question.answer, 0);
                assert!(question.correct_option().unwrap().starts_with("Right"));
            }
        }
        other => panic!("expected multiple choice, got {other:?}"),
    }
    assert_eq!(handle.call_count(), 1);
}

#[tokio::test]
async fn true_false_and_open_ended_kinds_decode() {
    let (generator, handle) = mock_generator();
    handle.push(MockResponse::json(true_false_reply(4)));
    handle.push(MockResponse::json(open_ended_reply(2)));

    let tf = generator
        .generate(&GenerationRequest::new(QuizKind::TrueFalse, SOLAR_CONTEXT).with_question_count(4))
        .await
        .unwrap();
    match tf {
        Quiz::TrueFalse { questions, .. } => {
            let answers: Vec<Truth> = questions.iter().map(|q| q.answer).collect();
            assert_eq!(answers, vec![Truth::True, Truth::False, Truth::True, Truth::False]);
        }
        other => panic!("expected true/false, got {other:?}"),
    }

    let open = generator
        .generate(&GenerationRequest::new(QuizKind::OpenEnded, SOLAR_CONTEXT).with_question_count(2))
        .await
        .unwrap();
    assert_eq!(open.kind(), QuizKind::OpenEnded);
    assert_eq!(open.answer_text(1), Some("Reference 2"));
}

#[tokio::test]
async fn reply_wrapped_in_prose_still_decodes() {
    let (generator, handle) = mock_generator();
    handle.push_text(format!("Here is the quiz you asked for:\n```json\n{}\n```\nGood luck!", multiple_choice_reply(2)));

    let quiz = generator
        .generate(&GenerationRequest::new(QuizKind::MultipleChoice, SOLAR_CONTEXT).with_question_count(2))
        .await
        .unwrap();
    assert_eq!(quiz.len(), 2);
}

#[tokio::test]
async fn literal_option_text_key_is_normalized_to_index() {
    let (generator, handle) = mock_generator();
    handle.push(MockResponse::json(json!({
        "questions": ["Capital of France?"],
        "alternatives": [["Lyon", "Paris", "Nice"]],
        "answers": ["Paris"],
    })));

    let quiz = generator
        .generate(&GenerationRequest::new(QuizKind::MultipleChoice, SOLAR_CONTEXT).with_question_count(1))
        .await
        .unwrap();
    match quiz {
        Quiz::MultipleChoice { questions, .. } => assert_eq!(questions[0].answer, 1),
        other => panic!("expected multiple choice, got {other:?}"),
    }
}

#[tokio::test]
async fn labelled_options_resolve_against_bare_key() {
    let (generator, handle) = mock_generator();
    handle.push(MockResponse::json(json!({
        "questions": ["Capital of France?"],
        "alternatives": [["a) Lyon", "b) Paris", "c) Nice"]],
        "answers": ["Paris"],
    })));

    let quiz = generator
        .generate(&GenerationRequest::new(QuizKind::MultipleChoice, SOLAR_CONTEXT).with_question_count(1))
        .await
        .unwrap();
    assert_eq!(quiz.answer_text(0), Some("b) Paris"));
}

#[tokio::test]
async fn blank_context_is_rejected_without_calling_the_model() {
    let (generator, handle) = mock_generator();
    let mut session = QuizSession::new();

    for context in ["", "   \n\t "] {
        let request = GenerationRequest::new(QuizKind::TrueFalse, context);
        let err = generator.generate_into(&mut session, &request).await.unwrap_err();
        assert!(matches!(err, QuizError::EmptyContext), "got {err:?}");
    }

    assert_eq!(handle.call_count(), 0);
    assert!(session.quiz().is_none());
}

#[tokio::test]
async fn missing_credential_fails_before_any_call() {
    let (generator, handle) = mock_generator();
    handle.set_missing_credential(true);
    handle.push(MockResponse::json(multiple_choice_reply(3)));

    let err = generator
        .generate(&GenerationRequest::new(QuizKind::MultipleChoice, SOLAR_CONTEXT))
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::MissingCredential(_)), "got {err:?}");
    assert_eq!(handle.call_count(), 0);
}

#[tokio::test]
async fn out_of_range_settings_are_rejected_before_any_call() {
    let (generator, handle) = mock_generator();

    let zero = GenerationRequest::new(QuizKind::MultipleChoice, SOLAR_CONTEXT).with_question_count(0);
    assert!(matches!(generator.generate(&zero).await, Err(QuizError::InvalidQuestionCount { got: 0, .. })));

    let eleven = GenerationRequest::new(QuizKind::MultipleChoice, SOLAR_CONTEXT).with_question_count(11);
    assert!(matches!(generator.generate(&eleven).await, Err(QuizError::InvalidQuestionCount { got: 11, .. })));

    let hot = GenerationRequest::new(QuizKind::MultipleChoice, SOLAR_CONTEXT).with_temperature(2.5);
    assert!(matches!(generator.generate(&hot).await, Err(QuizError::InvalidTemperature { .. })));

    assert_eq!(handle.call_count(), 0);
}

#[tokio::test]
async fn service_failure_leaves_session_untouched() {
    let (generator, handle) = mock_generator();
    let mut session = QuizSession::new();

    handle.push(MockResponse::json(true_false_reply(2)));
    let request = GenerationRequest::new(QuizKind::TrueFalse, SOLAR_CONTEXT).with_question_count(2);
    generator.generate_into(&mut session, &request).await.unwrap();
    let before = session.quiz().cloned();
    session.record_input(0, "True").unwrap();

    handle.push(MockResponse::Failure("upstream 500".to_string()));
    let err = generator.generate_into(&mut session, &request).await.unwrap_err();
    assert!(matches!(err, QuizError::Service(_)), "got {err:?}");
    assert_eq!(session.quiz().cloned(), before);
    assert_eq!(session.answers()[0], Some(quiz_forge::UserAnswer::Truth(Truth::True)));
}

#[tokio::test]
async fn slow_model_times_out() {
    let (generator, handle) = mock_generator_with_timeout(Duration::from_millis(50));
    handle.push(MockResponse::Delayed(
        Duration::from_secs(5),
        multiple_choice_reply(3).to_string(),
    ));

    let err = generator
        .generate(&GenerationRequest::new(QuizKind::MultipleChoice, SOLAR_CONTEXT))
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::Timeout(after) if after == Duration::from_millis(50)), "got {err:?}");
}

#[tokio::test]
async fn prose_without_json_is_no_structured_data() {
    let (generator, handle) = mock_generator();
    handle.push_text("I'm sorry, I cannot create a quiz from this text.");

    let err = generator
        .generate(&GenerationRequest::new(QuizKind::OpenEnded, SOLAR_CONTEXT))
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::NoStructuredData { kind: "open-ended", .. }), "got {err:?}");
}

#[tokio::test]
async fn json_of_the_wrong_shape_is_a_schema_decode_error() {
    let (generator, handle) = mock_generator();
    handle.push(MockResponse::json(json!({ "questions": "not a list", "answers": [] })));

    let err = generator
        .generate(&GenerationRequest::new(QuizKind::TrueFalse, SOLAR_CONTEXT))
        .await
        .unwrap_err();
    match err {
        QuizError::SchemaDecode { kind, raw, .. } => {
            assert_eq!(kind, "true-false");
            assert!(raw.contains("not a list"));
        }
        other => panic!("expected schema decode error, got {other:?}"),
    }
}

#[tokio::test]
async fn contract_violations_are_reported() {
    let (generator, handle) = mock_generator();
    let request = GenerationRequest::new(QuizKind::MultipleChoice, SOLAR_CONTEXT).with_question_count(2);

    handle.push(MockResponse::json(json!({
        "questions": ["Q1?", "Q2?"],
        "alternatives": [["x", "y"], ["x", "y"]],
        "answers": ["a"],
    })));
    assert!(matches!(
        generator.generate(&request).await,
        Err(QuizError::Contract(ContractViolation::AnswerCountMismatch { questions: 2, answers: 1 }))
    ));

    handle.push(MockResponse::json(json!({
        "questions": ["Q1?", "Q2?"],
        "alternatives": [["x", "y"]],
        "answers": ["a", "b"],
    })));
    assert!(matches!(
        generator.generate(&request).await,
        Err(QuizError::Contract(ContractViolation::OptionListCountMismatch { .. }))
    ));

    handle.push(MockResponse::json(json!({
        "questions": ["Q1?"],
        "alternatives": [["x", "y"]],
        "answers": ["e"],
    })));
    assert!(matches!(
        generator.generate(&request).await,
        Err(QuizError::Contract(ContractViolation::UnresolvableKey { index: 0, .. }))
    ));

    handle.push(MockResponse::json(json!({ "questions": [], "alternatives": [], "answers": [] })));
    assert!(matches!(
        generator.generate(&request).await,
        Err(QuizError::Contract(ContractViolation::NoQuestions))
    ));
}

#[tokio::test]
async fn count_deviation_is_tolerated() {
    let (generator, handle) = mock_generator();
    handle.push(MockResponse::json(true_false_reply(2)));

    let quiz = generator
        .generate(&GenerationRequest::new(QuizKind::TrueFalse, SOLAR_CONTEXT).with_question_count(5))
        .await
        .unwrap();
    assert_eq!(quiz.len(), 2);
}

#[tokio::test]
async fn prompt_carries_template_count_context_and_schema() {
    let (generator, handle) = mock_generator();
    handle.push(MockResponse::json(true_false_reply(4)));

    let settings = QuizSettings::default().with_question_count(4).with_temperature(0.7);
    let request = GenerationRequest::from_settings(QuizKind::TrueFalse, SOLAR_CONTEXT, &settings);
    generator.generate(&request).await.unwrap();

    let sent = handle.last_request().unwrap();
    assert!(sent.system.contains("true-false questions"));
    assert!(sent.user.contains("4 true/false questions"));
    assert!(sent.user.contains("Jupiter is the largest planet"));
    assert!(sent.user.contains("QuizTrueFalse"));
    assert_eq!(sent.temperature, 0.7);
    assert_eq!(sent.schema_name, "true-false");
}

#[tokio::test]
async fn locale_policy_selects_localized_template() {
    let (generator, handle) = mock_generator();
    handle.push(MockResponse::json(open_ended_reply(1)));
    handle.push(MockResponse::json(open_ended_reply(1)));

    let french = "Le Soleil est une étoile qui se trouve au centre du système solaire et les planètes tournent autour.";
    generator
        .generate(&GenerationRequest::new(QuizKind::OpenEnded, french).with_question_count(1))
        .await
        .unwrap();
    assert!(handle.last_request().unwrap().system.starts_with("Vous êtes"));

    let arabic = "الشمس نجم يقع في مركز المجموعة الشمسية، وتدور حوله الكواكب الثمانية التي تشمل الأرض والمريخ.";
    generator
        .generate(&GenerationRequest::new(QuizKind::OpenEnded, arabic).with_question_count(1))
        .await
        .unwrap();
    assert!(handle.last_request().unwrap().system.starts_with("أنت"));
}

#[tokio::test]
async fn fixed_locale_overrides_detection() {
    let (generator, handle) = mock_generator_in(Locale::Fr);
    handle.push(MockResponse::json(multiple_choice_reply(1)));

    generator
        .generate(&GenerationRequest::new(QuizKind::MultipleChoice, SOLAR_CONTEXT).with_question_count(1))
        .await
        .unwrap();
    let sent = handle.last_request().unwrap();
    assert!(sent.system.contains("choix multiples"));
    assert!(sent.user.starts_with("Créez un quiz avec 1 questions"));
}

//! Functional tests for the request pipeline against a mock gateway

mod common;

use common::{entries, settings, texts, MockGateway, Reply};
use jenna_api::error::PolicyViolation;
use jenna_api::pipeline::{
    ContentService, GenerationRequest, ImageGenRequest, TextRequest, UploadedImage,
};
use jenna_api::response::outcome::{
    CHILD_SAFETY_WARNING, EMPTY_IMAGES_WARNING, EMPTY_TEXT_WARNING, RESPONSIBLE_AI_WARNING,
};
use jenna_api::response::{base64, GenerationOutcome, Payload};
use std::sync::Arc;

const EXTENSION_WARNING: &str = "Only images with extensions jpeg, jpg and png are allowed.";
const SIZE_WARNING: &str = "File size is too large. Choose a file of a size lower than 20 MB.";

fn png(size: usize) -> UploadedImage {
    UploadedImage::new(vec![7u8; size], Some("image/png".to_string()))
}

fn text_request(prompt: &str, content_type: &str) -> TextRequest {
    TextRequest {
        prompt: prompt.to_string(),
        content_type: content_type.to_string(),
    }
}

fn image_request(prompt: &str, style: &str, orientation: &str) -> ImageGenRequest {
    ImageGenRequest {
        prompt: prompt.to_string(),
        style: style.to_string(),
        orientation: orientation.to_string(),
    }
}

#[tokio::test]
async fn test_text_request_returns_first_candidate() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Reply::Texts(texts(&["The Brave Fox", "Another take"])));
    let service = ContentService::new(gateway.clone(), &settings(dir.path()));

    let outcome = service
        .handle(GenerationRequest::Text(text_request("a brave fox", "1")))
        .await;

    assert_eq!(
        gateway.prompts.lock().as_slice(),
        ["Write a story with the following prompt: a brave fox. Include an appropriate title in bold for the content generated in the final response."]
    );
    assert_eq!(
        outcome,
        GenerationOutcome::Success {
            response: Payload::Text("The Brave Fox".to_string())
        }
    );
}

#[tokio::test]
async fn test_empty_text_result_is_warning() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Reply::Texts(vec![]));
    let service = ContentService::new(gateway, &settings(dir.path()));

    let outcome = service.generate_text(&text_request("a brave fox", "2")).await;

    assert_eq!(
        outcome,
        GenerationOutcome::Warning {
            warnings: vec![
                "Sorry. We are having trouble generating text content for this image. Try again."
                    .to_string()
            ]
        }
    );
    assert_eq!(EMPTY_TEXT_WARNING, "Sorry. We are having trouble generating text content for this image. Try again.");
}

#[tokio::test]
async fn test_unclassified_failure_is_error_with_raw_message() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Reply::Fail("503 The service is currently unavailable.".into()));
    let service = ContentService::new(gateway, &settings(dir.path()));

    let outcome = service.generate_text(&text_request("x", "1")).await;

    assert_eq!(
        outcome,
        GenerationOutcome::error("503 The service is currently unavailable.")
    );
}

#[tokio::test]
async fn test_disallowed_extension_never_reaches_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Reply::Texts(texts(&["caption"])));
    let service = ContentService::new(gateway.clone(), &settings(dir.path()));

    let gif = UploadedImage::new(vec![1, 2, 3], Some("image/gif".to_string()));
    let outcome = service.caption_image(gif).await;

    assert_eq!(outcome, GenerationOutcome::warning(EXTENSION_WARNING));
    assert_eq!(gateway.calls(), 0);
    assert_eq!(entries(dir.path()), 0);
}

#[tokio::test]
async fn test_oversized_png_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Reply::Texts(texts(&["caption"])));
    let service = ContentService::new(gateway.clone(), &settings(dir.path()));

    let outcome = service
        .handle(GenerationRequest::Caption {
            image: png(30_000_000),
        })
        .await;

    assert_eq!(
        outcome,
        GenerationOutcome::Warning {
            warnings: vec![SIZE_WARNING.to_string()]
        }
    );
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn test_all_checks_accumulate_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Reply::Texts(texts(&["story"])));
    let service = ContentService::new(gateway.clone(), &settings(dir.path()));

    let image = UploadedImage::new(vec![0u8; 27_000_000], Some("application/pdf".to_string()));
    let outcome = service
        .generate_text_from_image(image, "a storm", "1")
        .await;

    assert_eq!(
        outcome,
        GenerationOutcome::Warning {
            warnings: vec![EXTENSION_WARNING.to_string(), SIZE_WARNING.to_string()]
        }
    );
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn test_size_just_under_limit_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Reply::Texts(texts(&["a fox in the snow"])));
    let service = ContentService::new(gateway.clone(), &settings(dir.path()));

    let outcome = service.caption_image(png(26_999_999)).await;

    assert!(matches!(outcome, GenerationOutcome::Success { .. }));
    assert_eq!(gateway.calls(), 1);
}

#[tokio::test]
async fn test_captions_return_full_sequence_and_clean_up() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Reply::Texts(texts(&["a dog", "a brown dog", "a dog on grass"])));
    let service = ContentService::new(gateway.clone(), &settings(dir.path()));

    let jpeg = UploadedImage::new(vec![0xFF, 0xD8, 0xFF], Some("image/JPEG".to_string()));
    let outcome = service.caption_image(jpeg).await;

    assert_eq!(
        outcome,
        GenerationOutcome::Success {
            response: Payload::Captions(texts(&["a dog", "a brown dog", "a dog on grass"]))
        }
    );

    let seen = gateway.images.lock().clone();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].existed);
    assert_eq!(seen[0].mime_type, "image/jpeg");
    assert!(seen[0].path.starts_with(dir.path()));
    assert!(seen[0].path.to_string_lossy().ends_with(".jpeg"));
    assert!(!seen[0].path.exists());
    assert_eq!(entries(dir.path()), 0);
}

#[tokio::test]
async fn test_image_text_prompt_and_cleanup_on_error() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Reply::Fail("403 Permission denied on resource".into()));
    let service = ContentService::new(gateway.clone(), &settings(dir.path()));

    let outcome = service
        .handle(GenerationRequest::ImageText {
            image: png(64),
            prompt: "sunset over the bay".to_string(),
            content_type: "2".to_string(),
        })
        .await;

    assert_eq!(outcome, GenerationOutcome::error("403 Permission denied on resource"));
    assert_eq!(
        gateway.prompts.lock().as_slice(),
        ["Write a poem that rhymes about this image with the following prompt: sunset over the bay. Include an appropriate title in bold for the content generated in the final response."]
    );
    assert!(gateway.images.lock()[0].existed);
    assert_eq!(entries(dir.path()), 0);
}

#[tokio::test]
async fn test_image_text_returns_first_candidate_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Reply::Texts(texts(&["**Title**\nverse", "unused"])));
    let service = ContentService::new(gateway, &settings(dir.path()));

    let outcome = service.generate_text_from_image(png(10), "cats", "9").await;

    assert_eq!(
        outcome,
        GenerationOutcome::Success {
            response: Payload::Text("**Title**\nverse".to_string())
        }
    );
    assert_eq!(entries(dir.path()), 0);
}

#[tokio::test]
async fn test_policy_block_during_image_call_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Reply::Blocked(PolicyViolation::ResponsibleAi));
    let service = ContentService::new(gateway, &settings(dir.path()));

    let outcome = service.caption_image(png(10)).await;

    assert_eq!(outcome, GenerationOutcome::warning(RESPONSIBLE_AI_WARNING));
    assert_eq!(entries(dir.path()), 0);
}

#[tokio::test]
async fn test_panicking_gateway_still_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Reply::Panic);
    let service = Arc::new(ContentService::new(gateway.clone(), &settings(dir.path())));

    let task = {
        let service = service.clone();
        tokio::spawn(async move { service.caption_image(png(10)).await })
    };

    assert!(task.await.unwrap_err().is_panic());
    assert_eq!(gateway.calls(), 1);
    assert_eq!(entries(dir.path()), 0);
}

#[tokio::test]
async fn test_scratch_write_failure_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();

    let gateway = MockGateway::new(Reply::Texts(texts(&["caption"])));
    let service = ContentService::new(gateway.clone(), &settings(&blocker.join("scratch")));

    let outcome = service.caption_image(png(10)).await;

    assert!(matches!(outcome, GenerationOutcome::Error { .. }));
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn test_concurrent_uploads_use_distinct_files() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Reply::Texts(texts(&["caption"])));
    let service = Arc::new(ContentService::new(gateway.clone(), &settings(dir.path())));

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        tasks.push(tokio::spawn(async move { service.caption_image(png(32)).await }));
    }
    for task in tasks {
        assert!(matches!(task.await.unwrap(), GenerationOutcome::Success { .. }));
    }

    let mut paths: Vec<_> = gateway.images.lock().iter().map(|s| s.path.clone()).collect();
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), 8);
    assert_eq!(entries(dir.path()), 0);
}

#[tokio::test]
async fn test_image_generation_encodes_each_image() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Reply::Images(vec![b"first".to_vec(), b"second".to_vec()]));
    let service = ContentService::new(gateway.clone(), &settings(dir.path()));

    let outcome = service
        .handle(GenerationRequest::ImageGen(image_request("a lighthouse", "2", "1")))
        .await;

    assert_eq!(
        outcome,
        GenerationOutcome::Success {
            response: Payload::Images(vec![base64::encode(b"first"), base64::encode(b"second")])
        }
    );

    let params = gateway.image_params.lock()[0].clone();
    assert_eq!(params.prompt, "an oil painting of a lighthouse");
    assert_eq!(params.aspect_ratio, "1:1");
    assert_eq!(params.count, 4);
    assert_eq!(params.safety_level, "block_some");
    assert_eq!(params.person_policy, "allow_adult");
}

#[tokio::test]
async fn test_image_generation_defaults_to_sketch_landscape() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Reply::Images(vec![]));
    let service = ContentService::new(gateway.clone(), &settings(dir.path()));

    let outcome = service.generate_images(&image_request("a cat", "", "7")).await;

    assert_eq!(outcome, GenerationOutcome::warning(EMPTY_IMAGES_WARNING));
    let params = gateway.image_params.lock()[0].clone();
    assert_eq!(params.prompt, "sketch of a cat");
    assert_eq!(params.aspect_ratio, "4:3");
}

#[tokio::test]
async fn test_child_safety_failure_is_warning() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Reply::Fail(
        "400 Image generation failed with the following error: The prompt could not be submitted. Support codes: 17301594".into(),
    ));
    let service = ContentService::new(gateway, &settings(dir.path()));

    let outcome = service.generate_images(&image_request("kids", "1", "2")).await;

    assert_eq!(
        outcome,
        GenerationOutcome::Warning {
            warnings: vec![
                "Child content detected and blocked. Please ensure that your prompt does not solicit inappropriate content."
                    .to_string()
            ]
        }
    );
    assert_eq!(CHILD_SAFETY_WARNING, "Child content detected and blocked. Please ensure that your prompt does not solicit inappropriate content.");
}

#[tokio::test]
async fn test_responsible_ai_failure_is_warning() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = MockGateway::new(Reply::Fail(
        "400 This prompt contains sensitive words that violate Google's Responsible AI practices.".into(),
    ));
    let service = ContentService::new(gateway, &settings(dir.path()));

    let outcome = service.generate_images(&image_request("x", "3", "2")).await;

    assert_eq!(outcome, GenerationOutcome::warning(RESPONSIBLE_AI_WARNING));
}

#[tokio::test]
async fn test_title_instruction_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = settings(dir.path());
    settings.prompt.include_title = false;

    let gateway = MockGateway::new(Reply::Texts(texts(&["la la"])));
    let service = ContentService::new(gateway.clone(), &settings);

    service.generate_text(&text_request("rain", "")).await;

    assert_eq!(
        gateway.prompts.lock().as_slice(),
        ["Write a song that rhymes with the following prompt: rain."]
    );
}

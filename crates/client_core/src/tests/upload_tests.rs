use super::*;
use crate::{
    test_support::{drain_events, matrix_file, upload_response, ScriptedService},
    transport::ServiceError,
};

fn controller(
    service: Arc<ScriptedService>,
) -> (Arc<UploadController>, broadcast::Receiver<ClientEvent>) {
    let (events, rx) = broadcast::channel(64);
    (Arc::new(UploadController::new(service, events)), rx)
}

fn upload_states(events: Vec<ClientEvent>) -> Vec<UploadOutcome> {
    events
        .into_iter()
        .filter_map(|event| match event {
            ClientEvent::UploadChanged(outcome) => Some(outcome),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn clearing_selection_stays_idle_without_request() {
    let service = Arc::new(ScriptedService::default());
    let (uploads, _rx) = controller(service.clone());

    let outcome = uploads.select_file(None).await.expect("select none");

    assert_eq!(outcome, UploadOutcome::Idle);
    assert_eq!(uploads.outcome().await, UploadOutcome::Idle);
    assert_eq!(service.upload_call_count().await, 0);
}

#[tokio::test]
async fn selecting_file_passes_through_uploading_before_accepted() {
    let service = Arc::new(ScriptedService::default());
    service
        .reply_upload(Ok(upload_response("srv_matrix.csv", 2, 2)))
        .await;
    let (uploads, mut rx) = controller(service.clone());

    let outcome = uploads
        .select_file(Some(matrix_file("matrix.csv")))
        .await
        .expect("upload");

    let accepted = outcome.accepted().expect("accepted");
    assert_eq!(accepted.server_filename, "srv_matrix.csv");
    assert_eq!(
        upload_states(drain_events(&mut rx)),
        vec![
            UploadOutcome::Idle,
            UploadOutcome::Uploading,
            UploadOutcome::Accepted(accepted.clone()),
        ]
    );
    assert_eq!(
        service.upload_calls.lock().await.clone(),
        vec![("matrix.csv".to_string(), DataOrientation::FeatureMajorNamed)]
    );
}

#[tokio::test]
async fn structured_rejection_keeps_reason_verbatim() {
    let service = Arc::new(ScriptedService::default());
    service
        .reply_upload(Err(ServiceError::Rejected {
            status: 400,
            detail: "Row 2 has 3 values but the header declares 2 features".to_string(),
        }))
        .await;
    let (uploads, _rx) = controller(service);

    let outcome = uploads
        .select_file(Some(matrix_file("matrix.csv")))
        .await
        .expect("upload");

    assert_eq!(
        outcome,
        UploadOutcome::Rejected {
            reason: "Row 2 has 3 values but the header declares 2 features".to_string()
        }
    );
    assert_eq!(
        outcome.status_line().as_deref(),
        Some("Upload failed: Row 2 has 3 values but the header declares 2 features")
    );
}

#[tokio::test]
async fn unstructured_failures_read_service_unreachable() {
    let service = Arc::new(ScriptedService::default());
    service
        .reply_upload(Err(ServiceError::Status { status: 502 }))
        .await;
    service.reply_upload(Err(ServiceError::Unavailable)).await;
    let (uploads, _rx) = controller(service);

    for _ in 0..2 {
        let outcome = uploads
            .select_file(Some(matrix_file("matrix.csv")))
            .await
            .expect("upload");
        assert_eq!(
            outcome,
            UploadOutcome::Rejected {
                reason: UNREACHABLE_REASON.to_string()
            }
        );
    }
}

#[tokio::test]
async fn changing_orientation_without_file_sends_nothing() {
    let service = Arc::new(ScriptedService::default());
    let (uploads, _rx) = controller(service.clone());

    let outcome = uploads
        .change_orientation(DataOrientation::AnonymousSampleMajor)
        .await
        .expect("change");

    assert_eq!(outcome, UploadOutcome::Idle);
    assert_eq!(
        uploads.orientation().await,
        DataOrientation::AnonymousSampleMajor
    );
    assert_eq!(uploads.example().await, "10,30\n20,40");
    assert_eq!(service.upload_call_count().await, 0);
}

#[tokio::test]
async fn changing_orientation_revalidates_held_file() {
    let service = Arc::new(ScriptedService::default());
    service
        .reply_upload(Ok(upload_response("first.csv", 2, 2)))
        .await;
    service
        .reply_upload(Ok(upload_response("second.csv", 2, 2)))
        .await;
    let (uploads, _rx) = controller(service.clone());

    uploads
        .select_file(Some(matrix_file("matrix.csv")))
        .await
        .expect("upload");
    let outcome = uploads
        .change_orientation(DataOrientation::SampleMajorHeaded)
        .await
        .expect("revalidate");

    assert_eq!(
        outcome.accepted().map(|a| a.server_filename.as_str()),
        Some("second.csv")
    );
    let calls = service.upload_calls.lock().await.clone();
    assert_eq!(
        calls,
        vec![
            ("matrix.csv".to_string(), DataOrientation::FeatureMajorNamed),
            ("matrix.csv".to_string(), DataOrientation::SampleMajorHeaded),
        ]
    );
}

#[tokio::test]
async fn rejected_revalidation_discards_previous_acceptance() {
    let service = Arc::new(ScriptedService::default());
    service
        .reply_upload(Ok(upload_response("accepted.csv", 2, 2)))
        .await;
    service
        .reply_upload(Err(ServiceError::Rejected {
            status: 422,
            detail: "expected numeric values".to_string(),
        }))
        .await;
    let (uploads, _rx) = controller(service);

    uploads
        .select_file(Some(matrix_file("matrix.csv")))
        .await
        .expect("upload");
    assert!(uploads.accepted().await.is_some());

    uploads
        .change_orientation(DataOrientation::AnonymousFeatureMajor)
        .await
        .expect("revalidate");

    assert!(uploads.accepted().await.is_none());
}

#[tokio::test]
async fn submitting_without_file_prompts_user() {
    let service = Arc::new(ScriptedService::default());
    let (uploads, mut rx) = controller(service.clone());

    let err = uploads.submit_upload().await.expect_err("must prompt");

    assert_eq!(err, ClientError::NoFileSelected);
    match rx.try_recv().expect("prompt event") {
        ClientEvent::Prompt(message) => assert_eq!(message, err.to_string()),
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(uploads.outcome().await, UploadOutcome::Idle);
    assert_eq!(service.upload_call_count().await, 0);
}

#[tokio::test]
async fn superseded_upload_response_is_discarded() {
    let service = Arc::new(ScriptedService::default());
    let first = service.gate_upload().await;
    let second = service.gate_upload().await;
    let (uploads, _rx) = controller(service.clone());

    let first_task = tokio::spawn({
        let uploads = uploads.clone();
        async move { uploads.select_file(Some(matrix_file("matrix.csv"))).await }
    });
    service.wait_for_upload_calls(1).await;

    let second_task = tokio::spawn({
        let uploads = uploads.clone();
        async move {
            uploads
                .change_orientation(DataOrientation::SampleMajorNamed)
                .await
        }
    });
    service.wait_for_upload_calls(2).await;

    // The newer request resolves first, then the older one straggles in.
    second
        .send(Ok(upload_response("sample_major.csv", 20000, 50)))
        .expect("release second");
    let latest = second_task.await.expect("join").expect("upload");
    assert_eq!(
        latest.accepted().map(|a| a.server_filename.as_str()),
        Some("sample_major.csv")
    );

    first
        .send(Ok(upload_response("feature_major.csv", 50, 20000)))
        .expect("release first");
    let stale = first_task.await.expect("join").expect("upload");

    assert_eq!(stale, latest);
    assert_eq!(uploads.outcome().await, latest);
}

#[tokio::test]
async fn clearing_selection_drops_in_flight_response() {
    let service = Arc::new(ScriptedService::default());
    let pending = service.gate_upload().await;
    let (uploads, _rx) = controller(service.clone());

    let task = tokio::spawn({
        let uploads = uploads.clone();
        async move { uploads.select_file(Some(matrix_file("matrix.csv"))).await }
    });
    service.wait_for_upload_calls(1).await;
    assert!(uploads.outcome().await.is_uploading());

    uploads.select_file(None).await.expect("clear");
    pending
        .send(Ok(upload_response("late.csv", 2, 2)))
        .expect("release");
    task.await.expect("join").expect("upload");

    assert_eq!(uploads.outcome().await, UploadOutcome::Idle);
    assert_eq!(uploads.selected_filename().await, None);
}

#[tokio::test]
async fn abandoned_upload_resolves_to_unreachable() {
    let service = Arc::new(ScriptedService::default());
    let _gate = service.gate_upload().await;
    let (uploads, mut rx) = controller(service.clone());

    let result = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        uploads.select_file(Some(matrix_file("matrix.csv"))),
    )
    .await;

    assert!(result.is_err(), "upload should still be waiting on the gate");
    let expected = UploadOutcome::Rejected {
        reason: UNREACHABLE_REASON.to_string(),
    };
    assert_eq!(uploads.outcome().await, expected);
    assert!(!uploads.outcome().await.is_uploading());
    assert_eq!(uploads.accepted().await, None);
    assert_eq!(
        upload_states(drain_events(&mut rx)).last(),
        Some(&expected)
    );
}

#[tokio::test]
async fn abandoned_upload_does_not_override_newer_submission() {
    let service = Arc::new(ScriptedService::default());
    let _stalled = service.gate_upload().await;
    service
        .reply_upload(Ok(upload_response("srv_second.csv", 2, 2)))
        .await;
    let (uploads, _rx) = controller(service.clone());

    let stalled = tokio::spawn({
        let uploads = uploads.clone();
        async move { uploads.select_file(Some(matrix_file("first.csv"))).await }
    });
    service.wait_for_upload_calls(1).await;
    uploads
        .select_file(Some(matrix_file("second.csv")))
        .await
        .expect("second upload");
    stalled.abort();
    let _ = stalled.await;

    assert_eq!(
        uploads.accepted().await.map(|upload| upload.server_filename),
        Some("srv_second.csv".to_string())
    );
}

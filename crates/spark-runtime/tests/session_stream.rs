use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

use spark_runtime::{
    AgentTargets, Error, InvocationSession, OutputEventStream, RetryPolicy,
};
use spark_testing::events;
use spark_testing::{ScriptedAgentClient, ScriptedFrame};
use spark_types::{OutputEvent, ProgressStatus, ToolCallStatus, UserContext};

fn targets() -> AgentTargets {
    AgentTargets {
        agent_id: "AG1".to_string(),
        agent_alias_id: "AL1".to_string(),
    }
}

fn session_with(client: Arc<ScriptedAgentClient>) -> InvocationSession {
    InvocationSession::new(client, targets())
        .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(1)))
}

async fn collect(stream: OutputEventStream) -> Vec<Result<OutputEvent, Error>> {
    stream.collect().await
}

#[tokio::test]
async fn plan_invocation_produces_expected_sequence() {
    // The canonical flow: reasoning, one tool round-trip, then the answer
    let client = Arc::new(ScriptedAgentClient::from_events(vec![
        events::reasoning("Let me check course data"),
        events::tool_start("t1", "NebulaAPI", "get_course_information"),
        events::tool_end("t1", "CS 1337 found", 120),
        events::chunk("Here is your plan: ..."),
    ]));
    let session = session_with(client.clone());

    let stream = session.invoke("become a data engineer", "abc", None).await.unwrap();
    let output: Vec<OutputEvent> = collect(stream)
        .await
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(output.len(), 4);

    match &output[0] {
        OutputEvent::Trace { data, session_id } => {
            assert_eq!(session_id, "abc");
            assert_eq!(data.status, ProgressStatus::Progress);
            assert_eq!(data.reasoning.as_deref(), Some("Let me check course data"));
            assert_eq!(data.supervisor_session_key, "supervisor_abc");
        }
        other => panic!("Expected trace, got {:?}", other),
    }

    match &output[1] {
        OutputEvent::Trace { data, .. } => {
            assert_eq!(data.status, ProgressStatus::Started);
            assert_eq!(data.tool_calls[0].status, ToolCallStatus::Calling);
            assert_eq!(data.tool_calls[0].name, "NebulaAPI");
        }
        other => panic!("Expected trace, got {:?}", other),
    }

    match &output[2] {
        OutputEvent::Trace { data, .. } => {
            assert_eq!(data.status, ProgressStatus::Completed);
            assert_eq!(data.tool_calls[0].status, ToolCallStatus::Completed);
            assert_eq!(data.tool_calls[0].result.as_deref(), Some("CS 1337 found"));
            assert_eq!(data.tool_calls[0].elapsed_ms, Some(120));
        }
        other => panic!("Expected trace, got {:?}", other),
    }

    match &output[3] {
        OutputEvent::Chunk { text, session_id } => {
            assert_eq!(text, "Here is your plan: ...");
            assert_eq!(session_id, "abc");
        }
        other => panic!("Expected chunk, got {:?}", other),
    }
}

#[tokio::test]
async fn chunks_pass_through_verbatim_and_in_order() {
    let client = Arc::new(ScriptedAgentClient::from_events(vec![
        events::chunk("first "),
        events::reasoning("thinking"),
        events::chunk("second: with punctuation, émojis 🎓"),
    ]));
    let session = session_with(client);

    let stream = session.invoke("goal", "s1", None).await.unwrap();
    let output: Vec<OutputEvent> = collect(stream)
        .await
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();

    let texts: Vec<Option<&str>> = output
        .iter()
        .map(|event| match event {
            OutputEvent::Chunk { text, .. } => Some(text.as_str()),
            OutputEvent::Trace { .. } => None,
        })
        .collect();

    assert_eq!(
        texts,
        vec![
            Some("first "),
            None,
            Some("second: with punctuation, émojis 🎓"),
        ]
    );
}

#[tokio::test]
async fn heartbeat_frames_are_suppressed() {
    let client = Arc::new(ScriptedAgentClient::from_events(vec![
        events::model_invocation_noise(),
        events::model_invocation_noise(),
        events::chunk("done"),
    ]));
    let session = session_with(client);

    let stream = session.invoke("goal", "s1", None).await.unwrap();
    let output = collect(stream).await;

    assert_eq!(output.len(), 1);
    assert!(matches!(
        output[0].as_ref().unwrap(),
        OutputEvent::Chunk { text, .. } if text == "done"
    ));
}

#[tokio::test]
async fn failure_traces_always_reach_the_consumer() {
    let client = Arc::new(ScriptedAgentClient::from_events(vec![events::failure(
        "Access denied to collaborator",
        Some("JobMarket"),
    )]));
    let session = session_with(client);

    let stream = session.invoke("goal", "s1", None).await.unwrap();
    let output = collect(stream).await;

    assert_eq!(output.len(), 1);
    match output[0].as_ref().unwrap() {
        OutputEvent::Trace { data, .. } => {
            assert_eq!(data.status, ProgressStatus::Failed);
            assert_eq!(data.agent, "Collaborator: JobMarket");
            assert_eq!(
                data.failure_reason.as_deref(),
                Some("Access denied to collaborator")
            );
        }
        other => panic!("Expected trace, got {:?}", other),
    }
}

#[tokio::test]
async fn initiation_retries_twice_then_succeeds() {
    let client = Arc::new(
        ScriptedAgentClient::from_events(vec![events::chunk("ok")]).throttling_first(2),
    );
    let session = session_with(client.clone());

    let stream = session.invoke("goal", "s1", None).await.unwrap();
    let output = collect(stream).await;

    assert_eq!(client.attempts(), 3);
    assert_eq!(output.len(), 1);
}

#[tokio::test]
async fn initiation_gives_up_after_three_throttled_attempts() {
    let client = Arc::new(
        ScriptedAgentClient::from_events(vec![events::chunk("never delivered")])
            .throttling_first(10),
    );
    let session = session_with(client.clone());

    let err = match session.invoke("goal", "s1", None).await {
        Ok(_) => panic!("Expected invocation to fail"),
        Err(err) => err,
    };

    assert_eq!(client.attempts(), 3);
    match err {
        Error::RateLimited { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("Expected RateLimited, got {:?}", other),
    }
}

#[tokio::test]
async fn mid_stream_failure_terminates_without_retry() {
    let client = Arc::new(ScriptedAgentClient::new(vec![
        ScriptedFrame::Event(events::chunk("partial")),
        ScriptedFrame::TransportError("connection reset".to_string()),
        ScriptedFrame::Event(events::chunk("unreachable")),
    ]));
    let session = session_with(client.clone());

    let stream = session.invoke("goal", "s1", None).await.unwrap();
    let output = collect(stream).await;

    // One good chunk, then the error terminates the sequence; no retry
    assert_eq!(client.attempts(), 1);
    assert_eq!(output.len(), 2);
    assert!(output[0].is_ok());
    assert!(matches!(output[1].as_ref().unwrap_err(), Error::Client(_)));
}

#[tokio::test]
async fn correlation_state_resets_between_invocations() {
    // First invocation leaves a dangling tool start for t1
    let dangling = Arc::new(ScriptedAgentClient::from_events(vec![events::tool_start(
        "t1",
        "NebulaAPI",
        "get_course_information",
    )]));
    let session = session_with(dangling);
    let stream = session.invoke("goal", "s1", None).await.unwrap();
    let _ = collect(stream).await;

    // Second invocation on the same session instance sees a completion for
    // t1 with no matching start: it must take the fallback path, not the
    // stale NebulaAPI entry
    let orphan_completion = Arc::new(ScriptedAgentClient::from_events(vec![events::tool_end(
        "t1",
        "course details for CS 1337",
        45,
    )]));
    let session = session_with(orphan_completion);
    let stream = session.invoke("goal", "s1", None).await.unwrap();
    let output: Vec<OutputEvent> = collect(stream)
        .await
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();

    match &output[0] {
        OutputEvent::Trace { data, .. } => {
            assert_eq!(data.tool_calls[0].name, "Course Catalog Tools");
        }
        other => panic!("Expected trace, got {:?}", other),
    }
}

#[tokio::test]
async fn knowledge_base_lookup_round_trip() {
    let client = Arc::new(ScriptedAgentClient::from_events(vec![
        events::knowledge_base_start("kb-1", "course-catalog-index", "prerequisites for CS 4375"),
        events::knowledge_base_end("kb-1", 4),
    ]));
    let session = session_with(client);

    let stream = session.invoke("goal", "s1", None).await.unwrap();
    let output: Vec<OutputEvent> = collect(stream)
        .await
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();

    match &output[1] {
        OutputEvent::Trace { data, .. } => {
            let tool_call = &data.tool_calls[0];
            assert_eq!(tool_call.name, "course-catalog-index");
            assert_eq!(tool_call.reference_count, Some(4));
            assert_eq!(tool_call.status, ToolCallStatus::Completed);
        }
        other => panic!("Expected trace, got {:?}", other),
    }
}

#[tokio::test]
async fn request_carries_prompt_and_session_attributes() {
    let client = Arc::new(ScriptedAgentClient::from_events(vec![]));
    let session = session_with(client.clone());

    let context = UserContext {
        name: Some("Sam".to_string()),
        major: Some("Computer Science".to_string()),
        ..Default::default()
    };

    let stream = session
        .invoke("become a data engineer", "abc", Some(&context))
        .await
        .unwrap();
    let _ = collect(stream).await;

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];

    assert!(request.enable_trace);
    assert_eq!(request.session_id, "abc");
    assert!(request.input_text.starts_with("Create a comprehensive career plan for:"));
    assert!(request.input_text.contains("Student name: Sam"));
    assert!(request.input_text.contains("Major: Computer Science"));

    let attributes = request.session_attributes.as_ref().unwrap();
    assert_eq!(attributes.get("user_major").map(String::as_str), Some("Computer Science"));
}

#[tokio::test]
async fn collaborator_round_trip_assigns_call_ids() {
    let client = Arc::new(ScriptedAgentClient::from_events(vec![
        events::collaborator_start("JobMarket", "Research hiring trends"),
        events::collaborator_end("JobMarket", "Hiring is up for data roles."),
        events::collaborator_start("JobMarket", "Dig into salaries"),
    ]));
    let session = session_with(client);

    let stream = session.invoke("goal", "s1", None).await.unwrap();
    let output: Vec<OutputEvent> = collect(stream)
        .await
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();

    let call_ids: Vec<Option<&str>> = output
        .iter()
        .map(|event| match event {
            OutputEvent::Trace { data, .. } => data.call_id.as_deref(),
            OutputEvent::Chunk { .. } => None,
        })
        .collect();

    assert_eq!(
        call_ids,
        vec![
            Some("s1_JobMarket_1"),
            Some("s1_JobMarket_1"),
            Some("s1_JobMarket_2"),
        ]
    );
}

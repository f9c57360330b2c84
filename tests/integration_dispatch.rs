//! Dispatch loop integration tests
//!
//! Drives full turns through the public API with a scripted model and stub
//! tool handlers registered under the real catalog descriptors.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use mapagent::agent::{Agent, TurnOutcome};
use mapagent::error::{AgentError, Result};
use mapagent::llm::{LlmError, MockLlmClient};
use mapagent::tools::{AdapterError, BoundArgs, ToolError, ToolHandler, ToolRegistry, catalog};
use serde_json::{Value, json};
use tokio::sync::Mutex;

/// Stub handler that records every argument set it receives
struct RecordingTool {
    reply: Value,
    calls: AtomicUsize,
    seen: Mutex<Vec<Value>>,
}

impl RecordingTool {
    fn new(reply: Value) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolHandler for RecordingTool {
    async fn call(&self, args: &BoundArgs) -> std::result::Result<Value, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().await.push(args.to_value());
        Ok(self.reply.clone())
    }
}

/// Every catalog tool backed by the same recording stub
fn setup(llm: Arc<MockLlmClient>, tool: Arc<RecordingTool>) -> Agent {
    let registry = catalog::descriptors()
        .into_iter()
        .fold(ToolRegistry::new(), |registry, descriptor| registry.with_tool(descriptor, tool.clone()));
    Agent::new(llm, Arc::new(registry))
}

fn eiffel_results() -> Value {
    json!([
        {"display_name": "Tour Eiffel, Paris", "lat": 48.8582599, "lon": 2.2945006},
        {"display_name": "Eiffel Tower, Las Vegas", "lat": 36.1124, "lon": -115.1723},
        {"display_name": "Eiffel Tower Replica, Tianducheng", "lat": 30.3799, "lon": 120.2436}
    ])
}

#[tokio::test]
async fn test_eiffel_tower_geocode_scenario() -> Result<()> {
    let llm = Arc::new(MockLlmClient::with_replies([
        r#"{"tool":"osm_geocode","args":{"query":"Eiffel Tower","limit":3}}"#,
        "The Eiffel Tower in Paris is at about 48.858 N, 2.295 E. Two replicas also exist.",
    ]));
    let tool = RecordingTool::new(eiffel_results());
    let agent = setup(llm.clone(), tool.clone());

    let answer = agent.handle_turn("Geocode the Eiffel Tower").await?;

    assert_eq!(tool.calls(), 1);
    assert_eq!(tool.seen.lock().await[0], json!({"query": "Eiffel Tower", "limit": 3}));
    assert_eq!(
        answer,
        "The Eiffel Tower in Paris is at about 48.858 N, 2.295 E. Two replicas also exist."
    );
    assert!(!answer.contains("display_name"));

    // The explanation call saw the raw result
    let requests = llm.requests().await;
    assert_eq!(requests.len(), 2);
    assert!(requests[1][1].content.contains("Tour Eiffel, Paris"));
    assert!(requests[1][1].content.contains("Tool used: osm_geocode"));
    Ok(())
}

#[tokio::test]
async fn test_plain_prose_passthrough() -> Result<()> {
    let prose = "Geocoding converts a place name into latitude and longitude.";
    let llm = Arc::new(MockLlmClient::with_replies([prose]));
    let tool = RecordingTool::new(json!(null));
    let agent = setup(llm.clone(), tool.clone());

    let answer = agent.handle_turn("What is geocoding?").await?;

    assert_eq!(answer, prose);
    assert_eq!(tool.calls(), 0);
    assert_eq!(llm.call_count().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_answer_text_returned_unmodified() -> Result<()> {
    for text in ["", "  padded  ", "Line one\nLine two", "Ünïcödé 🗺️"] {
        let raw = json!({"answer": text}).to_string();
        let llm = Arc::new(MockLlmClient::with_replies([raw]));
        let agent = setup(llm, RecordingTool::new(json!(null)));

        assert_eq!(agent.handle_turn("hello").await?, text);
    }
    Ok(())
}

#[tokio::test]
async fn test_unknown_tool_makes_no_call() -> Result<()> {
    let llm = Arc::new(MockLlmClient::with_replies([r#"{"tool":"osm_teleport","args":{"to":"Paris"}}"#]));
    let tool = RecordingTool::new(json!(null));
    let agent = setup(llm.clone(), tool.clone());

    let outcome = agent.run_turn("Teleport me to Paris").await?;

    assert!(matches!(outcome, TurnOutcome::ToolFailed { error: ToolError::UnknownTool(_), .. }));
    assert!(!outcome.text().is_empty());
    assert!(outcome.text().contains("osm_teleport"));
    assert_eq!(tool.calls(), 0);
    // No explanation call after a failed dispatch
    assert_eq!(llm.call_count().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_missing_required_argument_makes_no_call() -> Result<()> {
    let llm = Arc::new(MockLlmClient::with_replies([
        r#"{"tool":"osrm_route_driving","args":{"start_lat":52.52,"start_lon":13.40,"end_lat":48.86}}"#,
    ]));
    let tool = RecordingTool::new(json!({"distance_km": 1054.0}));
    let agent = setup(llm, tool.clone());

    let outcome = agent.run_turn("Drive from Berlin to Paris").await?;

    match &outcome {
        TurnOutcome::ToolFailed {
            error: ToolError::InvalidArguments { tool, detail, .. },
            text,
        } => {
            assert_eq!(tool, "osrm_route_driving");
            assert!(detail.contains("end_lon"));
            assert!(text.contains("osrm_route_driving"));
        }
        other => panic!("Expected InvalidArguments, got {:?}", other),
    }
    assert_eq!(tool.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_coerced_arguments_reach_handler() -> Result<()> {
    let llm = Arc::new(MockLlmClient::with_replies([
        r#"{"tool":"osm_search_poi","args":{"lat":"48.8584","lon":"2.2945","radius_m":"100000","value":"cafe"}}"#,
        "There are several cafes near the tower.",
    ]));
    let tool = RecordingTool::new(json!({"count": 0, "pois": []}));
    let agent = setup(llm, tool.clone());

    agent.handle_turn("Cafes near the Eiffel Tower").await?;

    let seen = tool.seen.lock().await;
    assert_eq!(
        seen[0],
        json!({
            "lat": 48.8584,
            "lon": 2.2945,
            "radius_m": 5000,
            "key": "amenity",
            "value": "cafe",
            "limit": 20
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_explanation_sees_bound_arguments() -> Result<()> {
    let llm = Arc::new(MockLlmClient::with_replies([
        r#"{"tool":"osm_search_poi","args":{"lat":"48.8584","lon":"2.2945","radius_m":"100000","value":"cafe"}}"#,
        "There are no cafes within 5 km.",
    ]));
    let agent = setup(llm.clone(), RecordingTool::new(json!({"count": 0, "pois": []})));

    agent.handle_turn("Cafes near the Eiffel Tower").await?;

    let requests = llm.requests().await;
    let prompt = &requests[1][1].content;
    assert!(prompt.contains("\"radius_m\": 5000"));
    assert!(!prompt.contains("100000"));
    assert!(prompt.contains("\"key\": \"amenity\""));
    assert!(prompt.contains("\"limit\": 20"));
    assert!(prompt.contains("\"lat\": 48.8584"));
    Ok(())
}

#[tokio::test]
async fn test_malformed_json_never_errors() -> Result<()> {
    for raw in ["{\"tool\": \"osm_geocode\", \"args\": {", "not json at all", "[]", "{}"] {
        let llm = Arc::new(MockLlmClient::with_replies([raw]));
        let tool = RecordingTool::new(json!(null));
        let agent = setup(llm, tool.clone());

        let outcome = agent.run_turn("anything").await?;
        assert_eq!(outcome, TurnOutcome::Answered(raw.to_string()));
        assert_eq!(tool.calls(), 0);
    }
    Ok(())
}

#[tokio::test]
async fn test_model_failure_propagates() {
    let llm = Arc::new(MockLlmClient::new());
    llm.push_failure("inference endpoint unavailable").await;
    let agent = setup(llm, RecordingTool::new(json!(null)));

    let err = agent.handle_turn("Where is Berlin?").await.unwrap_err();

    assert!(matches!(err, AgentError::ModelCall(LlmError::Api { .. })));
}

#[tokio::test]
async fn test_outcome_class_is_stable_across_turns() -> Result<()> {
    let llm = Arc::new(MockLlmClient::new());
    for _ in 0..3 {
        llm.push_reply(r#"{"tool":"osrm_nearest_road","args":{"lat":52.517,"lon":13.389}}"#).await;
        llm.push_reply("You are next to Friedrichstraße.").await;
    }
    let tool = RecordingTool::new(json!({"snapped_lat": 52.517, "snapped_lon": 13.3888, "road_name": "Friedrichstraße"}));
    let agent = setup(llm, tool.clone());

    for _ in 0..3 {
        let outcome = agent.run_turn("Which road am I on?").await?;
        assert!(matches!(outcome, TurnOutcome::Explained { ref tool, .. } if tool == "osrm_nearest_road"));
    }
    assert_eq!(tool.calls(), 3);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_turns_share_agent() -> Result<()> {
    let llm = Arc::new(MockLlmClient::new());
    for _ in 0..4 {
        llm.push_reply(r#"{"answer": "ok"}"#).await;
    }
    let agent = Arc::new(setup(llm.clone(), RecordingTool::new(json!(null))));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let agent = agent.clone();
            tokio::spawn(async move { agent.handle_turn(&format!("message {}", i)).await })
        })
        .collect();

    for handle in handles {
        let answer = handle.await.expect("task panicked")?;
        assert_eq!(answer, "ok");
    }
    assert_eq!(llm.call_count().await, 4);
    Ok(())
}

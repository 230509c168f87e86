use parley_core::models::upstream::UpstreamEvent;
use parley_orchestrator::lines::{LineDecoder, parse_line};

const STREAM: &str = concat!(
    "data: {\"type\":\"state\",\"phase\":\"thinking\",\"message\":\"Thinking…\"}\n",
    ": keep-alive comment\n",
    "\n",
    "data: {\"type\":\"rewrite\",\"text\":\"Which jobs pay best?\"}\n",
    "data: {broken json\n",
    "data:{\"type\":\"answer\",\"text\":\"Surgeons.\",\"agent_graph_run_id\":\"g-7\"}\n",
);

fn decode(chunks: &[&[u8]]) -> Vec<UpstreamEvent> {
    let mut decoder = LineDecoder::new();
    let mut events = Vec::new();
    for chunk in chunks {
        events.extend(decoder.push(chunk));
    }
    events.extend(decoder.finish());
    events
}

#[test]
fn decodes_data_lines_and_skips_the_rest() {
    let events = decode(&[STREAM.as_bytes()]);
    let kinds: Vec<&str> = events.iter().map(UpstreamEvent::kind).collect();
    assert_eq!(kinds, ["state", "rewrite", "answer"]);
}

#[test]
fn chunk_boundaries_do_not_matter() {
    let bytes = STREAM.as_bytes();
    let expected = decode(&[bytes]);
    for i in 0..=bytes.len() {
        assert_eq!(decode(&[&bytes[..i], &bytes[i..]]), expected, "split at {i}");
    }
}

#[test]
fn residual_line_without_newline_is_flushed() {
    let mut decoder = LineDecoder::new();
    assert!(decoder.push(b"data: {\"type\":\"answer\",\"text\":\"late\"}").is_empty());
    assert_eq!(
        decoder.finish(),
        Some(UpstreamEvent::Answer {
            text: Some("late".to_string()),
            run_id: None,
        })
    );
    assert_eq!(decoder.finish(), None);
}

#[test]
fn crlf_and_surrounding_whitespace_are_tolerated() {
    assert_eq!(
        parse_line(b"  data:   {\"type\":\"route\",\"route\":\"sql\"}\r"),
        Some(UpstreamEvent::Route {
            route: Some("sql".to_string())
        })
    );
    assert_eq!(parse_line(b"event: answer"), None);
    assert_eq!(parse_line(b"data: {\"no_type\":true}"), None);
}

use pretty_assertions::assert_eq;
use request_tree::graph::{assemble, AssemblerConfig, Assembly, JoinTable};
use request_tree::output::{read_report, render_tree, report_to_string, to_report, write_report};
use request_tree::parser::{Initiator, RequestEvent, ResourceType, ResponseEvent};
use request_tree::utils::config::SCHEMA_VERSION;
use tempfile::tempdir;

fn sample_assembly() -> Assembly {
    let events = vec![
        RequestEvent::new("1", "http://a/index.html", Initiator::Other)
            .with_resource_type(ResourceType::Document)
            .with_frame("main"),
        RequestEvent::new("2", "http://a/app.js", Initiator::parser("http://a/index.html"))
            .with_resource_type(ResourceType::Script)
            .with_frame("main"),
        RequestEvent::new("3", "http://a/data.json", Initiator::script(["http://a/app.js"]))
            .with_resource_type(ResourceType::Fetch)
            .with_frame("main"),
        RequestEvent::new("4", "http://tracker/pixel.gif", Initiator::Other),
    ];
    let join: JoinTable = vec![
        ResponseEvent::new("1", 200, 1024),
        ResponseEvent::new("2", 200, 2048).with_timing(1.0, 1.2),
    ]
    .into_iter()
    .collect();

    assemble(&events, &join, &AssemblerConfig::new()).unwrap()
}

#[test]
fn test_report_contents() {
    let report = to_report("capture.json", sample_assembly(), 5);

    assert_eq!(report.version, SCHEMA_VERSION);
    assert_eq!(report.source, "capture.json");
    assert_eq!(report.tree.total_requests, 3);
    assert_eq!(report.tree.total_bytes, 3072);
    assert_eq!(report.orphans.len(), 1);
    assert_eq!(report.skipped_events, 0);
    assert_eq!(report.heavy_chains.len(), 2);
    assert_eq!(report.resource_breakdown[&ResourceType::Fetch].unknown_size, 1);
}

#[test]
fn test_write_and_read_report() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("report.json");

    let report = to_report("capture.json", sample_assembly(), 5);
    write_report(&report, &path).unwrap();
    assert!(path.is_file());

    let loaded = read_report(&path).unwrap();
    assert_eq!(loaded.tree, report.tree);
    assert_eq!(loaded.orphans, report.orphans);
    assert_eq!(loaded.resource_breakdown, report.resource_breakdown);
}

#[test]
fn test_report_json_field_names() {
    let report = to_report("capture.json", sample_assembly(), 5);
    let json = report_to_string(&report).unwrap();

    assert!(json.contains("\"generatedAt\""));
    assert!(json.contains("\"totalRequests\": 3"));
    assert!(json.contains("\"encodedBytes\": -1"));
    assert!(json.contains("\"resourceType\": \"Fetch\""));
    assert!(json.contains("\"kind\": \"ambiguous_initiator\""));
    // Nothing was malformed, so the sample is omitted
    assert!(!json.contains("malformedSample"));
}

#[test]
fn test_write_report_to_directory_fails() {
    let dir = tempdir().unwrap();
    let report = to_report("capture.json", sample_assembly(), 5);
    assert!(write_report(&report, dir.path()).is_err());
}

#[test]
fn test_render_sample_tree() {
    let assembly = sample_assembly();
    let rendered = render_tree(&assembly.tree.root, 6);
    let expected = "\
[200] 1.0 KiB http://a/index.html
`-- [200] 2.0 KiB http://a/app.js
    `-- [---] ? http://a/data.json
";
    assert_eq!(rendered, expected);
}

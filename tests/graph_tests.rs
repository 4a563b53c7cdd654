use pretty_assertions::assert_eq;
use request_tree::graph::{assemble, AssemblerConfig, JoinTable};
use request_tree::parser::{Initiator, RedirectResponse, RequestEvent, ResourceType, ResponseEvent};
use request_tree::utils::error::{GraphError, OrphanReason};

const BASE: &str = "http://localhost:8080";

fn url(path: &str) -> String {
    format!("{}{}", BASE, path)
}

fn root(path: &str) -> RequestEvent {
    RequestEvent::new("root", url(path), Initiator::Other)
        .with_resource_type(ResourceType::Document)
        .with_frame("main")
}

fn parsed(id: &str, path: &str, parent: &str) -> RequestEvent {
    RequestEvent::new(id, url(path), Initiator::parser(url(parent))).with_frame("main")
}

fn scripted(id: &str, path: &str, frames: &[&str]) -> RequestEvent {
    RequestEvent::new(id, url(path), Initiator::script(frames.iter().map(|f| url(f))))
        .with_frame("main")
}

fn redirected(id: &str, path: &str, from: &str, status: u16) -> RequestEvent {
    RequestEvent::new(id, url(path), Initiator::parser(url("/unused.html")))
        .with_frame("main")
        .with_redirect_from(RedirectResponse::new(url(from), status))
}

fn build(events: &[RequestEvent], join: &JoinTable) -> request_tree::graph::Assembly {
    assemble(events, join, &AssemblerConfig::new()).unwrap()
}

#[test]
fn test_parser_and_script_children() {
    let events = vec![
        root("/a.html"),
        parsed("1", "/a.js", "/a.html"),
        parsed("2", "/img.png", "/a.html"),
        scripted("3", "/data.json", &["/a.js"]),
    ];

    let assembly = build(&events, &JoinTable::new());
    let tree = &assembly.tree;

    assert_eq!(tree.total_requests, 4);
    assert_eq!(tree.root.url, url("/a.html"));

    let children: Vec<&str> = tree.root.children.iter().map(|n| n.url.as_str()).collect();
    assert_eq!(children, vec![url("/a.js"), url("/img.png")]);
    assert_eq!(tree.root.children[0].children[0].url, url("/data.json"));
    assert!(tree.root.children[1].children.is_empty());
    assert!(assembly.diagnostics.is_clean());
}

#[test]
fn test_redirect_chain_is_linear() {
    let events = vec![
        root("/page.html"),
        parsed("r", "/r1", "/page.html"),
        redirected("r", "/r2", "/r1", 302),
        redirected("r", "/final", "/r2", 302),
    ];
    let join: JoinTable = vec![ResponseEvent::new("r", 200, 900)].into_iter().collect();

    let assembly = build(&events, &join);
    let tree = &assembly.tree;

    assert_eq!(tree.total_requests, 4);
    assert!(tree.root.has_chain(&[
        &url("/page.html"),
        &url("/r1"),
        &url("/r2"),
        &url("/final"),
    ]));
    assert_eq!(tree.root.children.len(), 1);

    let chain = tree.root.chain_to(&url("/final")).unwrap();
    let statuses: Vec<Option<u16>> = chain.iter().map(|n| n.status).collect();
    assert_eq!(statuses, vec![None, Some(302), Some(302), Some(200)]);
    assert_eq!(chain[3].encoded_bytes, 900);
}

#[test]
fn test_redirect_with_new_request_id() {
    let events = vec![
        root("/page.html"),
        parsed("hop", "/go", "/page.html"),
        redirected("landed", "/dest.js", "/go", 307),
        scripted("x", "/data.json", &["/dest.js"]),
    ];
    let join: JoinTable = vec![
        ResponseEvent::new("hop", 200, 1),
        ResponseEvent::new("landed", 200, 50),
    ]
    .into_iter()
    .collect();

    let assembly = build(&events, &join);
    let root = &assembly.tree.root;

    assert!(root.has_chain(&[&url("/page.html"), &url("/go"), &url("/dest.js"), &url("/data.json")]));
    let hop = &root.children[0];
    assert_eq!(hop.status, Some(307));
    assert_eq!(hop.children[0].encoded_bytes, 50);
}

#[test]
fn test_subresources_follow_redirected_document() {
    // iframe.html -> redirect-asset.html (via /go) -> its script
    let events = vec![
        root("/iframe.html"),
        parsed("doc", "/go", "/iframe.html"),
        redirected("doc", "/redirect-asset.html", "/go", 302),
        parsed("js", "/js/load-script.js", "/redirect-asset.html"),
        scripted("json", "/assets/small.json", &["/js/load-script.js"]),
    ];

    let assembly = build(&events, &JoinTable::new());
    assert!(assembly.tree.root.has_chain(&[
        &url("/iframe.html"),
        &url("/go"),
        &url("/redirect-asset.html"),
        &url("/js/load-script.js"),
        &url("/assets/small.json"),
    ]));
}

#[test]
fn test_orphans_do_not_block_later_events() {
    let events = vec![
        root("/a.html"),
        RequestEvent::new("o1", url("/pixel.gif"), Initiator::Other),
        scripted("o2", "/beacon", &["/cdn/untracked.js"]),
        parsed("o3", "/child.css", "/never-seen.html"),
        parsed("1", "/style.css", "/a.html"),
    ];

    let assembly = build(&events, &JoinTable::new());

    assert_eq!(assembly.tree.total_requests, 2);
    assert_eq!(assembly.tree.root.children[0].url, url("/style.css"));

    let orphans = &assembly.diagnostics.orphans;
    assert_eq!(orphans.len(), 3);
    assert_eq!(orphans[0].event.request_id, "o1");
    assert_eq!(orphans[0].reason, OrphanReason::AmbiguousInitiator);
    assert_eq!(
        orphans[1].reason,
        OrphanReason::OrphanedInitiator {
            urls: vec![url("/cdn/untracked.js")]
        }
    );
    assert_eq!(
        orphans[2].reason,
        OrphanReason::OrphanedInitiator {
            urls: vec![url("/never-seen.html")]
        }
    );

    for orphan in orphans {
        assert!(assembly.tree.root.chain_to(&orphan.event.url).is_none());
    }
}

#[test]
fn test_script_stack_falls_back_to_outer_frame() {
    let events = vec![
        root("/a.html"),
        parsed("1", "/lib.js", "/a.html"),
        scripted("2", "/data.json", &["/eval-frame", "/lib.js", "/a.html"]),
    ];

    let assembly = build(&events, &JoinTable::new());
    assert!(assembly
        .tree
        .root
        .has_chain(&[&url("/a.html"), &url("/lib.js"), &url("/data.json")]));
}

#[test]
fn test_byte_totals_and_frames() {
    let events = vec![
        root("/a.html"),
        parsed("1", "/a.js", "/a.html"),
        parsed("2", "/frame.html", "/a.html").with_frame("child"),
        parsed("3", "/never-answered.png", "/a.html"),
    ];
    let join: JoinTable = vec![
        ResponseEvent::new("root", 200, 1000),
        ResponseEvent::new("1", 200, 4064),
        ResponseEvent::new("2", 200, 300),
    ]
    .into_iter()
    .collect();

    let tree = build(&events, &join).tree;

    assert_eq!(tree.total_bytes, 5364);
    assert_eq!(tree.root.children[2].encoded_bytes, -1);
    assert_eq!(
        tree.frame_ids.into_iter().collect::<Vec<_>>(),
        vec!["child".to_string(), "main".to_string()]
    );
}

#[test]
fn test_data_uri_children_attach_and_key() {
    let inline_font = format!("data:application/font-woff;base64,{}", "A".repeat(5000));
    let events = vec![
        root("/a.html"),
        parsed("1", "/a.js", "/a.html"),
        RequestEvent::new("2", inline_font.clone(), Initiator::script([url("/a.js")])),
    ];

    let tree = build(&events, &JoinTable::new()).tree;
    let font = &tree.root.children[0].children[0];
    assert_eq!(font.url, inline_font);
}

#[test]
fn test_children_resolve_through_data_uri_script() {
    let inline_script = format!("data:text/javascript;base64,{}", "QUJD".repeat(2000));
    // Same key prefix, different tail
    let same_prefix = format!("{}XYZ", &inline_script[..inline_script.len() - 3]);

    let events = vec![
        root("/a.html"),
        RequestEvent::new("1", inline_script.clone(), Initiator::parser(url("/a.html"))),
        RequestEvent::new("2", url("/from-inline.json"), Initiator::script([inline_script.clone()])),
        RequestEvent::new("3", url("/late.png"), Initiator::script([same_prefix])),
    ];

    let assembly = build(&events, &JoinTable::new());
    let script = &assembly.tree.root.children[0];
    assert_eq!(script.url, inline_script);

    let children: Vec<&str> = script.children.iter().map(|n| n.url.as_str()).collect();
    assert_eq!(children, vec![url("/from-inline.json"), url("/late.png")]);
    assert!(assembly.diagnostics.is_clean());
}

#[test]
fn test_repeated_redirecting_url_keeps_hops_apart() {
    // Two tracking pixels hitting the same 302 endpoint
    let events = vec![
        root("/page.html"),
        parsed("A", "/pixel", "/page.html"),
        redirected("A", "/x.gif", "/pixel", 302),
        parsed("B", "/pixel", "/page.html"),
        redirected("B", "/y.gif", "/pixel", 302),
    ];
    let join: JoinTable = vec![
        ResponseEvent::new("A", 200, 100),
        ResponseEvent::new("B", 200, 5000),
    ]
    .into_iter()
    .collect();

    let tree = build(&events, &join).tree;
    let hops = &tree.root.children;

    assert_eq!(hops.len(), 2);
    assert_eq!(hops[0].request_id, "A");
    assert_eq!(hops[0].status, Some(302));
    assert_eq!(hops[0].children.len(), 1);
    assert_eq!(hops[0].children[0].url, url("/x.gif"));
    assert_eq!(hops[0].children[0].encoded_bytes, 100);

    assert_eq!(hops[1].request_id, "B");
    assert_eq!(hops[1].status, Some(302));
    assert!(!hops[1].is_size_known());
    assert_eq!(hops[1].children.len(), 1);
    assert_eq!(hops[1].children[0].url, url("/y.gif"));
    assert_eq!(hops[1].children[0].encoded_bytes, 5000);

    assert_eq!(tree.total_requests, 5);
    assert_eq!(tree.total_bytes, 5100);
}

#[test]
fn test_no_events_is_an_error() {
    let result = assemble(&[], &JoinTable::new(), &AssemblerConfig::new());
    assert_eq!(result.unwrap_err(), GraphError::EmptyCapture);
}

#[test]
fn test_malformed_events_are_counted() {
    let events = vec![
        root("/a.html"),
        RequestEvent::new("", url("/x.js"), Initiator::parser(url("/a.html"))),
        RequestEvent::new("2", "", Initiator::parser(url("/a.html"))),
        parsed("3", "/ok.css", "/a.html"),
    ];

    let assembly = build(&events, &JoinTable::new());
    assert_eq!(assembly.diagnostics.skipped, 2);
    assert_eq!(assembly.diagnostics.malformed.len(), 2);
    assert_eq!(assembly.diagnostics.malformed[1].index, 2);
    assert_eq!(assembly.tree.total_requests, 2);
}

#[test]
fn test_reassembly_is_deterministic() {
    let events = vec![
        root("/a.html"),
        parsed("1", "/a.js", "/a.html"),
        parsed("2", "/r1", "/a.html"),
        redirected("2", "/r2", "/r1", 302),
        scripted("3", "/data.json", &["/a.js"]),
    ];
    let join: JoinTable = vec![ResponseEvent::new("1", 200, 10)].into_iter().collect();

    let first = build(&events, &join);
    let second = build(&events, &join);
    assert_eq!(first, second);
}

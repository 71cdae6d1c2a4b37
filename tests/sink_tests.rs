//! Tests for the report sinks.

use std::{
    fs,
    io::{BufRead, BufReader, Read, Write},
    net::TcpListener,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

use jsgrade::{
    Category, CheckOutcome, CheckRegistry, FnCheck, GradingEngine, ReportBundle,
    checks::reference_rubric,
    parse,
    sink::{
        self, BOUNDARY_REPORT, ConsoleSink, EXCEPTION_REPORT, FUNCTIONAL_REPORT, HttpPublisher,
        PublishPolicy, Sink, SinkError, TextReportSink, XML_REPORT, XmlReportSink,
    },
};
use tempfile::TempDir;

fn reference_bundle() -> ReportBundle {
    let tree = parse("function f() { console.log(\"hi\"); }").expect("parse");
    let registry = reference_rubric().expect("registry");
    GradingEngine::new("guid").run(&tree, &registry, "custom data")
}

fn mixed_category_bundle() -> ReportBundle {
    let tree = parse("").expect("parse");
    let registry = CheckRegistry::builder()
        .register(FnCheck::new("Works", |_| Ok(CheckOutcome::pass())), true, 1.0)
        .register(
            FnCheck::new("Limits", |_| Ok(CheckOutcome::fail("too big")))
                .with_category(Category::Boundary),
            true,
            1.0,
        )
        .register(
            FnCheck::new("Throws", |_| Ok(CheckOutcome::pass())).with_category(Category::Exception),
            false,
            1.0,
        )
        .build()
        .expect("registry");
    GradingEngine::new("guid").run(&tree, &registry, "")
}

/// A sink that always fails.
struct Broken;

impl Sink for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn consume(&self, _: &ReportBundle) -> Result<(), SinkError> {
        Err(SinkError::Io {
            path:   "/nowhere".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        })
    }
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).expect("read report")
}

#[test]
fn text_sink_appends_one_line_per_record() {
    let dir = TempDir::new().expect("tempdir");
    let sink = TextReportSink::new(dir.path());

    sink.consume(&reference_bundle()).expect("write");
    assert_eq!(
        read(dir.path(), FUNCTIONAL_REPORT),
        "FunctionDefinition=PASS\nFunctionArgumentsUsage=FAIL\nDefaultArgumentsUsage=FAIL\n\
         ReturnStatementUsage=FAIL\n"
    );

    // A second run appends rather than truncates.
    sink.consume(&reference_bundle()).expect("write again");
    assert_eq!(read(dir.path(), FUNCTIONAL_REPORT).lines().count(), 8);
}

#[test]
fn text_sink_splits_by_category() {
    let dir = TempDir::new().expect("tempdir");
    TextReportSink::new(dir.path())
        .consume(&mixed_category_bundle())
        .expect("write");

    assert_eq!(read(dir.path(), FUNCTIONAL_REPORT), "Works=PASS\n");
    assert_eq!(read(dir.path(), BOUNDARY_REPORT), "Limits=FAIL\n");
    assert_eq!(read(dir.path(), EXCEPTION_REPORT), "Throws=PASS\n");
}

#[test]
fn xml_sink_writes_a_case_per_record() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join(XML_REPORT);
    XmlReportSink::new(&path)
        .consume(&reference_bundle())
        .expect("write");

    let xml = fs::read_to_string(&path).expect("read xml");
    assert_eq!(xml.matches("<case>").count(), 4);
    assert!(xml.contains("<name>FunctionDefinition</name>"));
    assert!(xml.contains("<status>Pass</status>"));
    assert!(xml.contains("<status>Fail</status>"));
    assert!(xml.contains("<test-case-type>functional</test-case-type>"));
}

#[test]
fn stale_reports_are_removed() {
    let dir = TempDir::new().expect("tempdir");
    for name in [FUNCTIONAL_REPORT, XML_REPORT] {
        fs::write(dir.path().join(name), "old").expect("seed");
    }
    fs::write(dir.path().join("keep.txt"), "mine").expect("seed");

    let removed = sink::remove_stale_reports(dir.path()).expect("clean");

    assert_eq!(removed.len(), 2);
    assert!(!dir.path().join(FUNCTIONAL_REPORT).exists());
    assert!(!dir.path().join(XML_REPORT).exists());
    assert!(dir.path().join("keep.txt").exists());
}

#[test]
fn dispatch_continues_past_failing_sinks() {
    let dir = TempDir::new().expect("tempdir");
    let bundle = reference_bundle();
    let before = bundle.clone();
    let text = TextReportSink::new(dir.path());

    let failures = sink::dispatch(&bundle, &[&Broken, &text, &ConsoleSink]);

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "broken");
    assert!(dir.path().join(FUNCTIONAL_REPORT).exists());
    assert_eq!(bundle, before);
}

#[test]
fn per_record_publishing_sends_one_payload_per_check() {
    let bundle = reference_bundle();
    let publisher =
        HttpPublisher::new("http://127.0.0.1:9/results", PublishPolicy::PerRecord).expect("client");

    let payloads = publisher.payloads(&bundle);
    assert_eq!(payloads.len(), 4);
    for (payload, (key, record)) in payloads.iter().zip(bundle.iter()) {
        assert_eq!(payload.custom_data, "custom data");
        assert_eq!(payload.test_case_results.len(), 1);
        let dto = payload.test_case_results.get(key).expect("dto for key");
        assert_eq!(dto.method_name, record.check_name());
        assert_eq!(dto.method_type, "functional");
        assert_eq!(dto.actual_score, 1.0);
        assert!(dto.is_mandatory);
    }
}

#[test]
fn batch_publishing_uses_the_legacy_wire_shape() {
    let bundle = reference_bundle();
    let publisher =
        HttpPublisher::new("http://127.0.0.1:9/results", PublishPolicy::Batch).expect("client");

    let payloads = publisher.payloads(&bundle);
    assert_eq!(payloads.len(), 1);

    let value = serde_json::to_value(&payloads[0]).expect("serialize");
    assert_eq!(value["customData"], "custom data");
    let dto = &value["testCaseResults"]["guid-function-arguments-usage"];
    assert_eq!(dto["methodName"], "FunctionArgumentsUsage");
    assert_eq!(dto["methodType"], "functional");
    assert_eq!(dto["actualScore"], 1.0);
    assert_eq!(dto["earnedScore"], 0.0);
    assert_eq!(dto["status"], "Fail");
    assert_eq!(dto["isMandatory"], true);
    assert_eq!(dto["errorMessage"], "You must use function arguments inside your function.");
}

#[test]
fn batch_payload_keeps_bundle_order() {
    let bundle = reference_bundle();
    let publisher =
        HttpPublisher::new("http://127.0.0.1:9/results", PublishPolicy::Batch).expect("client");

    let payloads = publisher.payloads(&bundle);
    let keys: Vec<_> = payloads[0].test_case_results.iter().map(|(k, _)| k).collect();
    let expected: Vec<_> = bundle.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, expected);

    // "guid-function-definition" sorts after "guid-default-arguments-usage",
    // so a sorted map would put it second.
    let json = serde_json::to_string(&payloads[0]).expect("serialize");
    let first = json.find("guid-function-definition").expect("first key");
    let default = json.find("guid-default-arguments-usage").expect("default key");
    assert!(first < default);
}

/// Starts a server that answers every request with a 500 and counts them.
fn failing_server() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let url = format!("http://{}/results", listener.local_addr().expect("addr"));
    let count = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&count);

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let mut length = 0;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        length = value.trim().parse().unwrap_or(0);
                    }
                }
            }
            let mut body = vec![0; length];
            let _ = reader.read_exact(&mut body);
            seen.fetch_add(1, Ordering::SeqCst);
            let _ = stream.write_all(
                b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
        }
    });

    (url, count)
}

#[test]
fn per_record_publishing_continues_after_a_failed_request() {
    let (url, count) = failing_server();
    let bundle = reference_bundle();
    let publisher = HttpPublisher::new(url, PublishPolicy::PerRecord).expect("client");

    let result = publisher.consume(&bundle);

    assert!(matches!(result, Err(SinkError::Http { .. })));
    assert_eq!(count.load(Ordering::SeqCst), bundle.len());
}

//! Structural failures are reported through `tracing` at error level.

use std::io;
use std::sync::{Arc, Mutex};

use formtree::{Config, Form, FormError, NodeKind, list};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct Buffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Buffer {
    type Writer = Buffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn errors_logged_by(f: impl FnOnce()) -> String {
    let buffer = Buffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(Level::ERROR)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

const DOC: &str = r#"{"kind": "group", "children": [
    {"kind": "tabs",
     "buttons": [{"key": "info"}, {"key": "advanced"}],
     "panes": [
        {"id": "tab1-1", "controlled_by": "info"},
        {"id": "tab1-2", "controlled_by": "advanced"}
     ]},
    {"kind": "list", "segment": "workers", "template": {"kind": "group", "children": [
        {"kind": "text", "segment": "name"}
    ]}}
]}"#;

#[test]
fn removing_a_non_item_is_logged() {
    let mut form = Form::load(DOC, &Config::default()).unwrap();
    let section = form.section("workers").unwrap();
    let template = list::template_of(form.tree(), section).unwrap();

    let mut result = None;
    let logs = errors_logged_by(|| result = Some(form.remove_item(template)));
    assert_eq!(result, Some(Err(FormError::NotAListItem(template))));
    assert!(logs.contains("ERROR"), "{logs}");
    assert!(logs.contains("list item not removed"), "{logs}");
}

#[test]
fn selecting_an_unknown_tab_is_logged() {
    let mut form = Form::load(DOC, &Config::default()).unwrap();
    let group = form.tab_group("").unwrap();

    let mut result = None;
    let logs = errors_logged_by(|| result = Some(form.select_tab(group, "debug")));
    assert!(matches!(result, Some(Err(FormError::UnknownTab { .. }))));
    assert!(logs.contains("tab not selected"), "{logs}");
    assert!(logs.contains("debug"), "{logs}");
    assert!(matches!(
        &form.tree().node(group).unwrap().kind,
        NodeKind::TabGroup(tabs) if tabs.active == "info"
    ));
}

#[test]
fn successful_edits_log_no_errors() {
    let mut form = Form::load(DOC, &Config::default()).unwrap();
    let section = form.section("workers").unwrap();
    let group = form.tab_group("").unwrap();

    let logs = errors_logged_by(|| {
        let added = form.add_item(section).unwrap();
        form.select_tab(group, "advanced").unwrap();
        form.remove_item(added.item).unwrap();
    });
    assert!(logs.is_empty(), "{logs}");
}

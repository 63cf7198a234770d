pub(crate) use super::*;
pub(crate) use crate::tui::test_utils::{make_app, make_snapshot};


/// App with `count` variables named `v00`, `v01`, ... and the given page size.
pub(crate) fn make_app_with_variables(count: usize, page_size: usize) -> App {
    let mut app = make_app(page_size);
    let names: Vec<String> = (0..count).map(|i| format!("v{:02}", i)).collect();
    let rows: Vec<(&str, &str, &str)> = names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), if i % 2 == 0 { "int" } else { "str" }, "..."))
        .collect();
    app.apply_event(WatchEvent::Snapshot(make_snapshot(&rows)));
    app
}

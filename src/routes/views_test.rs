use super::*;
use crate::identity::model::Role;
use crate::state::test_helpers::sample_feedback;

fn admin() -> Identity {
    Identity { id: "u-1".into(), role: Role::Admin, display_name: "Ada <Admin>".into(), email: None }
}

#[test]
fn entry_mode_defaults_to_welcome() {
    assert_eq!(EntryMode::from_query(None), EntryMode::Welcome);
    assert_eq!(EntryMode::from_query(Some("login")), EntryMode::Login);
    assert_eq!(EntryMode::from_query(Some("forgot-password")), EntryMode::ForgotPassword);
    assert_eq!(EntryMode::from_query(Some("LOGIN")), EntryMode::Welcome);
}

#[test]
fn dashboard_tab_defaults_to_overview() {
    assert_eq!(DashboardTab::from_query(Some("feedback")), DashboardTab::Feedback);
    assert_eq!(DashboardTab::from_query(Some("bogus")), DashboardTab::Overview);
    assert_eq!(DashboardTab::from_query(None), DashboardTab::Overview);
}

#[test]
fn header_escapes_display_name() {
    let html = dashboard(&admin(), DashboardTab::Overview, Ok(&[][..]));
    assert!(html.contains("Ada &lt;Admin&gt;"));
    assert!(!html.contains("Ada <Admin>"));
}

#[test]
fn overview_counts_reviewed_entries() {
    let mut reviewed = sample_feedback("1");
    reviewed.status = Some("Resolved".into());
    let mut pending = sample_feedback("2");
    pending.status = Some("Pending".into());
    let records = vec![reviewed, pending, sample_feedback("3")];
    let html = dashboard(&admin(), DashboardTab::Overview, Ok(records.as_slice()));
    assert!(html.contains("<dt>Feedback entries</dt><dd>3</dd>"));
    assert!(html.contains("<dt>Reviewed</dt><dd>1</dd>"));
    assert!(html.contains("<dt>Awaiting review</dt><dd>2</dd>"));
}

#[test]
fn feedback_tab_links_each_entry() {
    let records = vec![sample_feedback("17")];
    let html = dashboard(&admin(), DashboardTab::Feedback, Ok(records.as_slice()));
    assert!(html.contains(r#"href="/admin/feedback/17""#));
}

#[test]
fn dashboard_shows_backend_error_inline() {
    let notice = Notice::Error("Feedback is unavailable right now.".into());
    let html = dashboard(&admin(), DashboardTab::Feedback, Err(&notice));
    assert!(html.contains(r#"role="alert""#));
    assert!(!html.contains("<table>"));
}

#[test]
fn guest_search_page_offers_login() {
    let guest = Identity::guest("guest-1");
    let html = search(&guest, &Scratch::default(), None, None);
    assert!(html.contains("/?mode=login"));
    assert!(html.contains("End session"));
    assert!(!html.contains("/admin/dashboard"));
}

#[test]
fn search_page_lists_history_newest_first() {
    let scratch = Scratch { bookmarks: vec!["graph theory".into()], history: vec!["b".into(), "a".into()] };
    let html = search(&admin(), &scratch, Some("b"), None);
    let b = html.find(r#"href="/search?q=b""#).unwrap();
    let a = html.find(r#"href="/search?q=a""#).unwrap();
    assert!(b < a);
    assert!(html.contains("<li>graph theory</li>"));
}

#[test]
fn history_links_percent_encode_the_query() {
    let scratch = Scratch { bookmarks: vec![], history: vec!["deep learning&x=1".into(), "é".into()] };
    let html = search(&admin(), &scratch, None, None);
    assert!(html.contains(r#"href="/search?q=deep%20learning%26x%3D1""#));
    assert!(html.contains(r#"href="/search?q=%C3%A9""#));
}

#[test]
fn form_values_and_notices_are_escaped() {
    let notice = Notice::Error("<script>alert(1)</script>".into());
    let html = entry(EntryMode::Login, None, r#"a"><b>@x.com"#, Some(&notice));
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
    assert!(!html.contains(r#"a"><b>"#));
    assert!(html.contains(r#"role="alert""#));
}

#[test]
fn pages_render_as_full_documents() {
    let html = loading();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Loading | LitPath AI</title>"));
    assert!(not_ready().contains("Still loading"));
}

#[test]
fn reset_page_hides_form_once_done() {
    assert!(reset_password("tok", None, false).contains(r#"action="/reset-password/tok""#));
    assert!(!reset_password("tok", None, true).contains("<form"));
}

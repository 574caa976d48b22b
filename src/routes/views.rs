//! Server-rendered HTML for every screen.
//!
//! Screens are Leptos views rendered to a string inside a throwaway reactive
//! owner. Text and attribute values are escaped by the renderer, so views
//! never build markup by hand.

use leptos::prelude::*;

use crate::identity::context::Scratch;
use crate::identity::model::Identity;
use crate::services::backend::{FeedbackRecord, FeedbackReview};
use crate::services::feedback::{MAX_COMMENT_LEN, MAX_RATING, MIN_RATING};

/// Inline message shown above a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

fn render<V, F>(page: F) -> String
where
    V: IntoView,
    F: FnOnce() -> V,
{
    Owner::new().with(|| page().to_html())
}

// =============================================================================
// CHROME
// =============================================================================

#[component]
fn NoticeLine(notice: Option<Notice>) -> impl IntoView {
    match notice {
        None => ().into_any(),
        Some(Notice::Info(msg)) => view! { <p class="notice info">{msg}</p> }.into_any(),
        Some(Notice::Error(msg)) => view! { <p class="notice error" role="alert">{msg}</p> }.into_any(),
    }
}

#[component]
fn SiteHeader(identity: Option<Identity>) -> impl IntoView {
    let Some(identity) = identity else {
        return view! { <header><a href="/">"LitPath AI"</a></header> }.into_any();
    };
    let staff = identity.is_staff().then(|| view! { <a href="/admin/dashboard">"Dashboard"</a> });
    let (who, leave) = if identity.is_guest() {
        ("Guest".to_owned(), "End session")
    } else {
        (identity.display_name, "Log out")
    };
    view! {
        <header>
            <a href="/">"LitPath AI"</a>
            <nav>
                <a href="/search">"Search"</a>
                <a href="/feedback-form">"Feedback"</a>
                {staff}
            </nav>
            <span class="who">{who}</span>
            <form method="post" action="/auth/logout">
                <button type="submit">{leave}</button>
            </form>
        </header>
    }
    .into_any()
}

#[component]
fn Layout(#[prop(into)] title: String, identity: Option<Identity>, children: Children) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <title>{format!("{title} | LitPath AI")}</title>
            </head>
            <body>
                <SiteHeader identity=identity/>
                <main>{children()}</main>
            </body>
        </html>
    }
}

/// Neutral placeholder while the identity is still resolving.
#[must_use]
pub fn loading() -> String {
    render(|| {
        view! {
            <Layout title="Loading" identity=None>
                <p class="loading" aria-busy="true">"Loading…"</p>
            </Layout>
        }
    })
}

/// Body of the `503` sent when a form arrives before the identity resolves.
#[must_use]
pub fn not_ready() -> String {
    render(|| {
        view! {
            <Layout title="Still loading" identity=None>
                <h1>"Still loading"</h1>
                <p aria-busy="true">"Your session is still being restored. Submit the form again in a moment."</p>
            </Layout>
        }
    })
}

// =============================================================================
// ENTRY
// =============================================================================

/// Sub-modes of the entry screen, selected by `?mode=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMode {
    Welcome,
    Login,
    ForgotPassword,
}

impl EntryMode {
    #[must_use]
    pub fn from_query(mode: Option<&str>) -> Self {
        match mode {
            Some("login") => Self::Login,
            Some("forgot-password") => Self::ForgotPassword,
            _ => Self::Welcome,
        }
    }
}

#[must_use]
pub fn entry(mode: EntryMode, identity: Option<&Identity>, email: &str, notice: Option<&Notice>) -> String {
    let identity = identity.cloned();
    let notice = notice.cloned();
    let email = email.to_owned();
    render(move || {
        let body = match mode {
            EntryMode::Welcome => view! {
                <h1>"Welcome to LitPath AI"</h1>
                <NoticeLine notice=notice/>
                <p>"Discover research from the university repository."</p>
                <form method="post" action="/auth/guest">
                    <button type="submit">"Continue as guest"</button>
                </form>
                <p><a href="/?mode=login">"Log in"</a></p>
            }
            .into_any(),
            EntryMode::Login => view! {
                <h1>"Log in"</h1>
                <NoticeLine notice=notice/>
                <form method="post" action="/auth/login">
                    <label>"Email " <input type="email" name="email" value=email required=true/></label>
                    <label>"Password " <input type="password" name="password" required=true/></label>
                    <button type="submit">"Log in"</button>
                </form>
                <p><a href="/?mode=forgot-password">"Forgot password?"</a></p>
                <p><a href="/">"Back"</a></p>
            }
            .into_any(),
            EntryMode::ForgotPassword => view! {
                <h1>"Reset your password"</h1>
                <NoticeLine notice=notice/>
                <form method="post" action="/auth/forgot-password">
                    <label>"Email " <input type="email" name="email" value=email required=true/></label>
                    <button type="submit">"Send reset link"</button>
                </form>
                <p><a href="/?mode=login">"Back to log in"</a></p>
            }
            .into_any(),
        };
        view! { <Layout title="Welcome" identity=identity>{body}</Layout> }
    })
}

#[must_use]
pub fn reset_password(token: &str, notice: Option<&Notice>, done: bool) -> String {
    let action = format!("/reset-password/{token}");
    let notice = notice.cloned();
    render(move || {
        let form = if done {
            view! { <p><a href="/?mode=login">"Log in with your new password"</a></p> }.into_any()
        } else {
            view! {
                <form method="post" action=action>
                    <label>"New password " <input type="password" name="password" minlength="8" required=true/></label>
                    <label>"Confirm password " <input type="password" name="confirm" minlength="8" required=true/></label>
                    <button type="submit">"Set password"</button>
                </form>
            }
            .into_any()
        };
        view! {
            <Layout title="Reset password" identity=None>
                <h1>"Choose a new password"</h1>
                <NoticeLine notice=notice/>
                {form}
            </Layout>
        }
    })
}

/// Standalone message page for rejected actions.
#[must_use]
pub fn message(title: &str, identity: Option<&Identity>, notice: &Notice) -> String {
    let title = title.to_owned();
    let heading = title.clone();
    let identity = identity.cloned();
    let notice = notice.clone();
    render(move || {
        view! {
            <Layout title=title identity=identity>
                <h1>{heading}</h1>
                <NoticeLine notice=Some(notice)/>
                <p><a href="/">"Continue"</a></p>
            </Layout>
        }
    })
}

// =============================================================================
// SEARCH
// =============================================================================

#[component]
fn HistoryList(history: Vec<String>) -> impl IntoView {
    if history.is_empty() {
        return view! { <p>"No searches yet."</p> }.into_any();
    }
    let items = history
        .into_iter()
        .map(|entry| {
            let href = format!("/search?q={}", urlencoding::encode(&entry));
            view! { <li><a href=href>{entry}</a></li> }
        })
        .collect_view();
    view! { <ul>{items}</ul> }.into_any()
}

#[component]
fn BookmarkList(bookmarks: Vec<String>) -> impl IntoView {
    if bookmarks.is_empty() {
        return view! { <p>"No bookmarks yet."</p> }.into_any();
    }
    let items = bookmarks.into_iter().map(|item| view! { <li>{item}</li> }).collect_view();
    view! { <ul>{items}</ul> }.into_any()
}

#[must_use]
pub fn search(identity: &Identity, scratch: &Scratch, query: Option<&str>, notice: Option<&Notice>) -> String {
    let identity = identity.clone();
    let scratch = scratch.clone();
    let q = query.unwrap_or_default().to_owned();
    let notice = notice.cloned();
    render(move || {
        let term = q.trim().to_owned();
        let results = (!term.is_empty()).then(|| {
            view! {
                <section class="results">
                    <h2>{format!("Results for “{term}”")}</h2>
                    <form method="post" action="/search/bookmarks">
                        <input type="hidden" name="item" value={term.clone()}/>
                        <button type="submit">"Bookmark this search"</button>
                    </form>
                </section>
            }
        });
        let hint = identity.is_guest().then(|| {
            view! {
                <p class="hint">
                    "Guest bookmarks and history last until this session ends. "
                    <a href="/?mode=login">"Log in"</a>
                    " to keep your work."
                </p>
            }
        });
        view! {
            <Layout title="Search" identity=Some(identity)>
                <h1>"Search"</h1>
                <NoticeLine notice=notice/>
                <form method="get" action="/search">
                    <input type="search" name="q" value=q placeholder="Search theses and dissertations"/>
                    <button type="submit">"Search"</button>
                </form>
                {results}
                <section class="history">
                    <h2>"Recent searches"</h2>
                    <HistoryList history=scratch.history/>
                </section>
                <section class="bookmarks">
                    <h2>"Bookmarks"</h2>
                    <BookmarkList bookmarks=scratch.bookmarks/>
                </section>
                {hint}
            </Layout>
        }
    })
}

// =============================================================================
// FEEDBACK FORM
// =============================================================================

#[must_use]
pub fn feedback_form(identity: &Identity, notice: Option<&Notice>) -> String {
    let identity = identity.clone();
    let notice = notice.cloned();
    render(move || {
        let options = (MIN_RATING..=MAX_RATING)
            .map(|rating| view! { <option value={rating.to_string()}>{rating.to_string()}</option> })
            .collect_view();
        view! {
            <Layout title="Feedback" identity=Some(identity)>
                <h1>"Tell us how we did"</h1>
                <NoticeLine notice=notice/>
                <form method="post" action="/feedback-form">
                    <label>"Rating " <select name="rating" required=true>{options}</select></label>
                    <label>"Comment " <textarea name="comment" maxlength={MAX_COMMENT_LEN.to_string()}></textarea></label>
                    <button type="submit">"Submit feedback"</button>
                </form>
            </Layout>
        }
    })
}

// =============================================================================
// ADMIN
// =============================================================================

/// Dashboard tabs, selected by `?activeTab=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardTab {
    Overview,
    Feedback,
}

impl DashboardTab {
    #[must_use]
    pub fn from_query(tab: Option<&str>) -> Self {
        match tab {
            Some("feedback") => Self::Feedback,
            _ => Self::Overview,
        }
    }
}

fn field(value: Option<&str>) -> String {
    value.unwrap_or("-").to_owned()
}

fn is_reviewed(record: &FeedbackRecord) -> bool {
    record.status.as_deref().is_some_and(|s| !s.trim().is_empty() && s != "Pending")
}

#[component]
fn OverviewPanel(identity: Identity, total: usize, reviewed: usize) -> impl IntoView {
    view! {
        <section class="overview">
            <p>{format!("Signed in as {} ({}).", identity.display_name, identity.role.as_str())}</p>
            <dl>
                <dt>"Feedback entries"</dt><dd>{total.to_string()}</dd>
                <dt>"Reviewed"</dt><dd>{reviewed.to_string()}</dd>
                <dt>"Awaiting review"</dt><dd>{(total - reviewed).to_string()}</dd>
            </dl>
        </section>
    }
}

#[component]
fn FeedbackTable(records: Vec<FeedbackRecord>) -> impl IntoView {
    let empty = records.is_empty().then(|| view! { <p>"No feedback yet."</p> });
    let rows = records
        .into_iter()
        .map(|record| {
            let href = format!("/admin/feedback/{}", record.id);
            view! {
                <tr>
                    <td><a href=href>{record.id.clone()}</a></td>
                    <td>{field(record.created_at.as_deref())}</td>
                    <td>{field(record.rating.as_deref())}</td>
                    <td>{field(record.comment.as_deref())}</td>
                    <td>{field(record.status.as_deref())}</td>
                </tr>
            }
        })
        .collect_view();
    view! {
        <section class="feedback">
            <table>
                <thead>
                    <tr><th>"ID"</th><th>"Date"</th><th>"Rating"</th><th>"Comment"</th><th>"Status"</th></tr>
                </thead>
                <tbody>{rows}</tbody>
            </table>
            {empty}
        </section>
    }
}

#[must_use]
pub fn dashboard(identity: &Identity, tab: DashboardTab, feedback: Result<&[FeedbackRecord], &Notice>) -> String {
    let identity = identity.clone();
    let feedback = feedback.map(<[FeedbackRecord]>::to_vec).map_err(Notice::clone);
    render(move || {
        let content = match feedback {
            Err(notice) => view! { <NoticeLine notice=Some(notice)/> }.into_any(),
            Ok(records) => match tab {
                DashboardTab::Overview => {
                    let reviewed = records.iter().filter(|r| is_reviewed(r)).count();
                    view! { <OverviewPanel identity={identity.clone()} total={records.len()} reviewed=reviewed/> }.into_any()
                }
                DashboardTab::Feedback => view! { <FeedbackTable records=records/> }.into_any(),
            },
        };
        view! {
            <Layout title="Dashboard" identity=Some(identity)>
                <h1>"Admin dashboard"</h1>
                <nav class="tabs">
                    <a href="/admin/dashboard?activeTab=overview">"Overview"</a>
                    <a href="/admin/dashboard?activeTab=feedback">"Feedback"</a>
                </nav>
                {content}
            </Layout>
        }
    })
}

#[must_use]
pub fn feedback_detail(
    identity: &Identity,
    record: &FeedbackRecord,
    review: &FeedbackReview,
    notice: Option<&Notice>,
) -> String {
    let identity = identity.clone();
    let record = record.clone();
    let review = review.clone();
    let notice = notice.cloned();
    render(move || {
        let action = format!("/admin/feedback/{}", record.id);
        view! {
            <Layout title="Feedback review" identity=Some(identity)>
                <h1>{format!("Feedback {}", record.id)}</h1>
                <NoticeLine notice=notice/>
                <dl>
                    <dt>"Submitted"</dt><dd>{field(record.created_at.as_deref())}</dd>
                    <dt>"By"</dt><dd>{field(record.submitted_by.as_deref())}</dd>
                    <dt>"Rating"</dt><dd>{field(record.rating.as_deref())}</dd>
                    <dt>"Comment"</dt><dd>{field(record.comment.as_deref())}</dd>
                </dl>
                <form method="post" action=action>
                    <label>"Status " <input name="status" value=review.status/></label>
                    <label>"Category " <input name="admin_category" value=review.admin_category/></label>
                    <label>"Valid? " <input name="is_valid" value=review.is_valid/></label>
                    <label>"Validity remarks " <textarea name="validity_remarks">{review.validity_remarks}</textarea></label>
                    <label>"Doable? " <input name="is_doable" value=review.is_doable/></label>
                    <label>"Feasibility remarks " <textarea name="feasibility_remarks">{review.feasibility_remarks}</textarea></label>
                    <button type="submit">"Save review"</button>
                </form>
                <p><a href="/admin/dashboard?activeTab=feedback">"Back to feedback"</a></p>
            </Layout>
        }
    })
}

#[cfg(test)]
#[path = "views_test.rs"]
mod tests;

//! HTML pages assembled from the embedded files under `templates/`.
//!
//! Templates contain `{{name}}` placeholders. [`fill`] substitutes them in a
//! single pass, so user content that happens to contain a placeholder is never
//! expanded. Every value coming from users is escaped before it is inserted.

use std::sync::OnceLock;

use html_escape::{encode_double_quoted_attribute, encode_quoted_attribute};
use regex::Regex;
use rust_embed::RustEmbed;

use crate::auth::can_edit;
use crate::core::paginator::Page;
use crate::forms::{CommentForm, FormErrors, LoginForm, PostForm, SignupForm};
use crate::models::{Comment, Group, Post, User};

#[derive(RustEmbed)]
#[folder = "templates"]
struct Templates;

fn load(name: &str) -> anyhow::Result<String> {
    let file = Templates::get(name).ok_or_else(|| anyhow::anyhow!("Template {} not found", name))?;
    Ok(String::from_utf8(file.data.into_owned())?)
}

/// Replace every `{{key}}` in `template` with its value. Unknown keys render empty.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                if let Some((_, value)) = values.iter().find(|(k, _)| *k == key) {
                    out.push_str(value);
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn escape(text: &str) -> String {
    encode_quoted_attribute(text).into_owned()
}

fn url_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"https?://[^\s<]+").expect("Regex should compile"))
}

/// Escaped post or comment body with clickable links and line breaks.
pub fn render_text(text: &str) -> String {
    let escaped = escape(text);
    let linked = url_regex().replace_all(&escaped, |caps: &regex::Captures| {
        let url = &caps[0];
        format!(r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#, url, url)
    });
    linked.replace("\r\n", "<br>").replace('\n', "<br>")
}

fn page(viewer: Option<&User>, title: &str, content: &str) -> anyhow::Result<String> {
    let base = load("base.html")?;
    let nav = render_nav(viewer);
    Ok(fill(
        &base,
        &[
            ("title", escape(title).as_str()),
            ("nav", nav.as_str()),
            ("content", content),
        ],
    ))
}

fn render_nav(viewer: Option<&User>) -> String {
    match viewer {
        Some(user) => format!(
            r#"<a href="/create/">New post</a>
      <a href="/follow/">Following</a>
      <a href="/profile/{}/">{}</a>
      <a href="/auth/logout/">Log out</a>"#,
            urlencode_path(&user.username),
            escape(&user.username)
        ),
        None => r#"<a href="/auth/login/">Log in</a>
      <a href="/auth/signup/">Sign up</a>"#
            .to_string(),
    }
}

fn urlencode_path(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

// === Fragments ===

fn render_post_card(viewer: Option<&User>, post: &Post, show_group_link: bool) -> anyhow::Result<String> {
    let card = load("post_card.html")?;

    let group_link = match (&post.group_slug, &post.group_title, show_group_link) {
        (Some(slug), Some(title), true) => format!(
            r#"<a class="group-link" href="/group/{}/">#{}</a>"#,
            urlencode_path(slug),
            escape(title)
        ),
        _ => String::new(),
    };
    let image = post
        .image()
        .map(|path| {
            format!(
                r#"<img class="post-image" src="/media/{}" alt="">"#,
                encode_double_quoted_attribute(path)
            )
        })
        .unwrap_or_default();
    let edit_link = if viewer.is_some_and(|v| can_edit(v, post)) {
        format!(r#"<a href="/posts/{}/edit/">Edit</a>"#, post.id)
    } else {
        String::new()
    };

    Ok(fill(
        &card,
        &[
            ("id", post.id.to_string().as_str()),
            ("author_username", urlencode_path(&post.author_username).as_str()),
            ("author_name", escape(&post.author_display_name()).as_str()),
            ("pub_date", post.pub_date.format("%-d %b %Y %H:%M").to_string().as_str()),
            ("text", render_text(&post.text).as_str()),
            ("image", image.as_str()),
            ("group_link", group_link.as_str()),
            ("edit_link", edit_link.as_str()),
        ],
    ))
}

fn render_post_list(viewer: Option<&User>, page: &Page<Post>, show_group_link: bool) -> anyhow::Result<String> {
    if page.is_empty() {
        return Ok(r#"<p class="empty">No posts yet.</p>"#.to_string());
    }
    let mut html = String::new();
    for post in &page.items {
        html.push_str(&render_post_card(viewer, post, show_group_link)?);
    }
    Ok(html)
}

fn render_paginator<T>(page: &Page<T>) -> String {
    if page.num_pages <= 1 {
        return String::new();
    }
    let mut html = String::from(r#"<nav class="paginator">"#);
    if let Some(prev) = page.previous_number() {
        html.push_str(r#"<a href="?page=1">&laquo; first</a> "#);
        html.push_str(&format!(r#"<a href="?page={}">previous</a> "#, prev));
    }
    html.push_str(&format!(
        r#"<span class="current">Page {} of {}</span>"#,
        page.number, page.num_pages
    ));
    if let Some(next) = page.next_number() {
        html.push_str(&format!(r#" <a href="?page={}">next</a>"#, next));
        html.push_str(&format!(r#" <a href="?page={}">last &raquo;</a>"#, page.num_pages));
    }
    html.push_str("</nav>");
    html
}

fn render_field_errors(errors: &FormErrors, field: &str) -> String {
    render_error_list(errors.for_field(field))
}

fn render_error_list(messages: &[String]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let items: String = messages
        .iter()
        .map(|m| format!("<li>{}</li>", escape(m)))
        .collect();
    format!(r#"<ul class="errorlist">{}</ul>"#, items)
}

// === Pages ===

pub fn render_index(viewer: Option<&User>, posts: &Page<Post>) -> anyhow::Result<String> {
    let content = fill(
        &load("index.html")?,
        &[
            ("posts", render_post_list(viewer, posts, true)?.as_str()),
            ("paginator", render_paginator(posts).as_str()),
        ],
    );
    page(viewer, "Latest posts", &content)
}

pub fn render_group(viewer: Option<&User>, group: &Group, posts: &Page<Post>) -> anyhow::Result<String> {
    let description = ammonia::clean(&group.description);
    let content = fill(
        &load("group_list.html")?,
        &[
            ("title", escape(&group.title).as_str()),
            ("description", description.as_str()),
            ("posts", render_post_list(viewer, posts, false)?.as_str()),
            ("paginator", render_paginator(posts).as_str()),
        ],
    );
    page(viewer, &group.title, &content)
}

pub struct ProfileStats {
    pub post_count: i64,
    pub followers: i64,
    pub following: i64,
    /// Whether the viewer follows this author.
    pub viewer_follows: bool,
}

pub fn render_profile(
    viewer: Option<&User>,
    author: &User,
    stats: &ProfileStats,
    posts: &Page<Post>,
) -> anyhow::Result<String> {
    let username = urlencode_path(&author.username);
    let follow_button = match viewer {
        Some(v) if v.id != author.id => {
            if stats.viewer_follows {
                format!(r#"<a class="button light" href="/profile/{}/unfollow/">Unfollow</a>"#, username)
            } else {
                format!(r#"<a class="button" href="/profile/{}/follow/">Follow</a>"#, username)
            }
        }
        _ => String::new(),
    };

    let content = fill(
        &load("profile.html")?,
        &[
            ("name", escape(&author.display_name()).as_str()),
            ("username", escape(&author.username).as_str()),
            ("post_count", stats.post_count.to_string().as_str()),
            ("followers", stats.followers.to_string().as_str()),
            ("following", stats.following.to_string().as_str()),
            ("follow_button", follow_button.as_str()),
            ("posts", render_post_list(viewer, posts, true)?.as_str()),
            ("paginator", render_paginator(posts).as_str()),
        ],
    );
    page(viewer, &format!("Profile of {}", author.display_name()), &content)
}

pub fn render_post_detail(
    viewer: Option<&User>,
    post: &Post,
    author_post_count: i64,
    comments: &[Comment],
    form: &CommentForm,
    errors: &FormErrors,
) -> anyhow::Result<String> {
    let comment_form = if viewer.is_some() {
        fill(
            &load("comment_form.html")?,
            &[
                ("id", post.id.to_string().as_str()),
                ("text", escape(&form.text).as_str()),
                ("text_errors", render_field_errors(errors, "text").as_str()),
            ],
        )
    } else {
        format!(
            r#"<p><a href="/auth/login/?next=/posts/{}/">Log in</a> to comment.</p>"#,
            post.id
        )
    };

    let mut comments_html = String::new();
    for comment in comments {
        comments_html.push_str(&format!(
            r#"<div class="comment"><a href="/profile/{}/">{}</a> <span class="date">{}</span><p>{}</p></div>"#,
            urlencode_path(&comment.author_username),
            escape(&comment.author_username),
            comment.created.format("%-d %b %Y %H:%M"),
            render_text(&comment.text)
        ));
    }

    let content = fill(
        &load("post_detail.html")?,
        &[
            ("post", render_post_card(viewer, post, true)?.as_str()),
            ("author_username", urlencode_path(&post.author_username).as_str()),
            ("author_name", escape(&post.author_display_name()).as_str()),
            ("author_post_count", author_post_count.to_string().as_str()),
            ("comment_count", comments.len().to_string().as_str()),
            ("comments", comments_html.as_str()),
            ("comment_form", comment_form.as_str()),
        ],
    );
    page(viewer, &format!("Post {}", post.label()), &content)
}

/// The create/edit form. `editing` is the post being edited, if any.
pub fn render_post_form(
    viewer: Option<&User>,
    form: &PostForm,
    errors: &FormErrors,
    groups: &[Group],
    editing: Option<&Post>,
) -> anyhow::Result<String> {
    let mut options = String::from(r#"<option value="">---------</option>"#);
    for group in groups {
        let value = group.id.to_string();
        let selected = if value == form.group { " selected" } else { "" };
        options.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            value,
            selected,
            escape(&group.title)
        ));
    }

    let (heading, action, button) = match editing {
        Some(post) => ("Edit post", format!("/posts/{}/edit/", post.id), "Save"),
        None => ("New post", "/create/".to_string(), "Publish"),
    };
    let current_image = editing
        .and_then(Post::image)
        .map(|path| {
            format!(
                r#"<p class="help">Current image: <a href="/media/{0}">{0}</a></p>"#,
                encode_double_quoted_attribute(path)
            )
        })
        .unwrap_or_default();

    let content = fill(
        &load("post_create.html")?,
        &[
            ("heading", heading),
            ("action", action.as_str()),
            ("button", button),
            ("non_field_errors", render_error_list(errors.non_field()).as_str()),
            ("text", escape(&form.text).as_str()),
            ("text_errors", render_field_errors(errors, "text").as_str()),
            ("group_options", options.as_str()),
            ("group_errors", render_field_errors(errors, "group").as_str()),
            ("current_image", current_image.as_str()),
            ("image_errors", render_field_errors(errors, "image").as_str()),
        ],
    );
    page(viewer, heading, &content)
}

pub fn render_follow_index(viewer: Option<&User>, posts: &Page<Post>) -> anyhow::Result<String> {
    let content = fill(
        &load("follow.html")?,
        &[
            ("posts", render_post_list(viewer, posts, true)?.as_str()),
            ("paginator", render_paginator(posts).as_str()),
        ],
    );
    page(viewer, "Posts by authors you follow", &content)
}

pub fn render_login(form: &LoginForm, errors: &FormErrors, next: &str) -> anyhow::Result<String> {
    let content = fill(
        &load("login.html")?,
        &[
            ("next", escape(next).as_str()),
            ("non_field_errors", render_error_list(errors.non_field()).as_str()),
            ("username", escape(&form.username).as_str()),
            ("username_errors", render_field_errors(errors, "username").as_str()),
            ("password_errors", render_field_errors(errors, "password").as_str()),
        ],
    );
    page(None, "Log in", &content)
}

pub fn render_signup(form: &SignupForm, errors: &FormErrors) -> anyhow::Result<String> {
    let content = fill(
        &load("signup.html")?,
        &[
            ("non_field_errors", render_error_list(errors.non_field()).as_str()),
            ("first_name", escape(&form.first_name).as_str()),
            ("first_name_errors", render_field_errors(errors, "first_name").as_str()),
            ("last_name", escape(&form.last_name).as_str()),
            ("last_name_errors", render_field_errors(errors, "last_name").as_str()),
            ("username", escape(&form.username).as_str()),
            ("username_errors", render_field_errors(errors, "username").as_str()),
            ("email", escape(&form.email).as_str()),
            ("email_errors", render_field_errors(errors, "email").as_str()),
            ("password1_errors", render_field_errors(errors, "password1").as_str()),
            ("password2_errors", render_field_errors(errors, "password2").as_str()),
        ],
    );
    page(None, "Sign up", &content)
}

pub fn render_logged_out() -> anyhow::Result<String> {
    page(None, "Logged out", &load("logged_out.html")?)
}

pub fn render_error(status: u16, message: &str) -> anyhow::Result<String> {
    let content = fill(
        &load("error.html")?,
        &[
            ("status", status.to_string().as_str()),
            ("message", escape(message).as_str()),
        ],
    );
    page(None, &format!("Error {}", status), &content)
}

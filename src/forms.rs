//! Submitted field sets and their validation.
//!
//! A handler reads the request body into a [`RawForm`], binds it to one of the
//! [`Submission`] types and validates it. Validation never touches storage: on
//! success it yields an unsaved value for the caller to persist, on failure a
//! [`FormErrors`] map to render next to the fields.

use std::collections::{BTreeMap, HashMap};

use actix_web::http::header;
use actix_web::web::Bytes;
use actix_web::HttpRequest;
use image::ImageFormat;
use regex::Regex;
use std::sync::OnceLock;

use crate::config::{MAX_NAME_LENGTH, MAX_USERNAME_LENGTH, MIN_PASSWORD_LENGTH};
use crate::core::errors::{AppError, AppResult};
use crate::core::query_params::parse_form_pairs;
use crate::models::{DbId, Group, Post};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Field values and uploaded files of one request body.
#[derive(Debug, Clone, Default)]
pub struct RawForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl RawForm {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            files: HashMap::new(),
        }
    }

    pub fn with_file(mut self, name: &str, file: UploadedFile) -> Self {
        self.files.insert(name.to_string(), file);
        self
    }

    /// Reads a urlencoded or multipart body.
    pub async fn from_request(req: &HttpRequest, body: Bytes) -> AppResult<Self> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if content_type.starts_with("multipart/form-data") {
            Self::from_multipart(content_type, body).await
        } else {
            let text = std::str::from_utf8(&body)
                .map_err(|_| AppError::BadRequest("Form body is not valid UTF-8".to_string()))?;
            Ok(Self {
                fields: parse_form_pairs(text),
                files: HashMap::new(),
            })
        }
    }

    async fn from_multipart(content_type: &str, body: Bytes) -> AppResult<Self> {
        let boundary = multer::parse_boundary(content_type)
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart boundary: {}", e)))?;
        let stream = futures_util::stream::once(async move { Ok::<Bytes, std::io::Error>(body) });
        let mut multipart = multer::Multipart::new(stream, boundary);

        let mut form = RawForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(|m| m.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?;

            match filename {
                Some(filename) => {
                    form.files.insert(
                        name,
                        UploadedFile {
                            filename,
                            content_type,
                            data,
                        },
                    );
                }
                None => {
                    let value = String::from_utf8(data.to_vec()).map_err(|_| {
                        AppError::BadRequest("Form body is not valid UTF-8".to_string())
                    })?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    /// Trimmed value, empty when absent.
    pub fn field(&self, name: &str) -> String {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    /// Value as submitted; passwords are not trimmed.
    pub fn raw_field(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    /// A file input left empty still arrives as a part with no content.
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files
            .get(name)
            .filter(|f| !f.filename.is_empty() || !f.data.is_empty())
    }
}

/// Field-level and form-level error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn for_field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// A user submission bound from a [`RawForm`] with its own field set.
pub trait Submission: Sized {
    /// What validation needs beyond the submitted fields.
    type Context: ?Sized;
    /// The unsaved value produced by a successful validation.
    type Valid;

    fn bind(raw: &RawForm) -> Self;

    fn validate(&self, ctx: &Self::Context) -> Result<Self::Valid, FormErrors>;
}

// === Post ===

#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub text: String,
    pub group: String,
    pub image: Option<UploadedFile>,
}

#[derive(Debug, Clone)]
pub struct ValidImage {
    pub data: Bytes,
    pub extension: &'static str,
}

#[derive(Debug, Clone)]
pub struct ValidPost {
    pub text: String,
    pub group_id: Option<DbId>,
    pub image: Option<ValidImage>,
}

impl PostForm {
    /// Prefilled with the current values of `post`, for the edit page.
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()).unwrap_or_default(),
            image: None,
        }
    }
}

impl Submission for PostForm {
    /// Groups a post may be filed under.
    type Context = [Group];
    type Valid = ValidPost;

    fn bind(raw: &RawForm) -> Self {
        Self {
            text: raw.field("text"),
            group: raw.field("group"),
            image: raw.file("image").cloned(),
        }
    }

    fn validate(&self, groups: &[Group]) -> Result<ValidPost, FormErrors> {
        let mut errors = FormErrors::default();

        if self.text.is_empty() {
            errors.add("text", REQUIRED);
        }

        let group_id = if self.group.is_empty() {
            None
        } else {
            match self.group.parse::<DbId>() {
                Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
                _ => {
                    errors.add("group", INVALID_CHOICE);
                    None
                }
            }
        };

        let image = match &self.image {
            Some(file) => match validate_image(&file.data) {
                Some(valid) => Some(valid),
                None => {
                    errors.add("image", INVALID_IMAGE);
                    None
                }
            },
            None => None,
        };

        errors.into_result(ValidPost {
            text: self.text.clone(),
            group_id,
            image,
        })
    }
}

fn validate_image(data: &Bytes) -> Option<ValidImage> {
    let format = image::guess_format(data).ok()?;
    image::load_from_memory_with_format(data, format).ok()?;
    let extension = match format {
        ImageFormat::Gif => "gif",
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpg",
        ImageFormat::WebP => "webp",
        _ => return None,
    };
    Some(ValidImage {
        data: data.clone(),
        extension,
    })
}

// === Comment ===

#[derive(Debug, Clone, Default)]
pub struct CommentForm {
    pub text: String,
}

impl Submission for CommentForm {
    type Context = ();
    type Valid = String;

    fn bind(raw: &RawForm) -> Self {
        Self {
            text: raw.field("text"),
        }
    }

    fn validate(&self, _: &()) -> Result<String, FormErrors> {
        let mut errors = FormErrors::default();
        if self.text.is_empty() {
            errors.add("text", REQUIRED);
        }
        errors.into_result(self.text.clone())
    }
}

// === Accounts ===

fn username_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("Regex should compile"))
}

fn email_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Regex should compile"))
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

#[derive(Debug, Clone)]
pub struct ValidSignup {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Submission for SignupForm {
    type Context = ();
    type Valid = ValidSignup;

    fn bind(raw: &RawForm) -> Self {
        Self {
            first_name: raw.field("first_name"),
            last_name: raw.field("last_name"),
            username: raw.field("username"),
            email: raw.field("email"),
            password1: raw.raw_field("password1"),
            password2: raw.raw_field("password2"),
        }
    }

    fn validate(&self, _: &()) -> Result<ValidSignup, FormErrors> {
        let mut errors = FormErrors::default();

        if self.first_name.chars().count() > MAX_NAME_LENGTH {
            errors.add("first_name", format!("Ensure this value has at most {} characters.", MAX_NAME_LENGTH));
        }
        if self.last_name.chars().count() > MAX_NAME_LENGTH {
            errors.add("last_name", format!("Ensure this value has at most {} characters.", MAX_NAME_LENGTH));
        }

        if self.username.is_empty() {
            errors.add("username", REQUIRED);
        } else if self.username.chars().count() > MAX_USERNAME_LENGTH {
            errors.add("username", format!("Ensure this value has at most {} characters.", MAX_USERNAME_LENGTH));
        } else if !username_regex().is_match(&self.username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        if !self.email.is_empty() && !email_regex().is_match(&self.email) {
            errors.add("email", "Enter a valid email address.");
        }

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        } else if self.password1.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(
                "password1",
                format!("This password is too short. It must contain at least {} characters.", MIN_PASSWORD_LENGTH),
            );
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        } else if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        errors.into_result(ValidSignup {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            password: self.password1.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl Submission for LoginForm {
    type Context = ();
    type Valid = (String, String);

    fn bind(raw: &RawForm) -> Self {
        Self {
            username: raw.field("username"),
            password: raw.raw_field("password"),
        }
    }

    fn validate(&self, _: &()) -> Result<(String, String), FormErrors> {
        let mut errors = FormErrors::default();
        if self.username.is_empty() {
            errors.add("username", REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.into_result((self.username.clone(), self.password.clone()))
    }
}

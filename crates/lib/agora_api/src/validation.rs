//! Request body validation.

use crate::error::{AppError, AppResult};
use crate::models::{
    CommentRequest, CreatePostRequest, LoginRequest, SignupRequest, UpdatePostRequest,
};

const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 20;
const NICKNAME_MAX: usize = 10;
const TITLE_MAX: usize = 26;
const EMAIL_MAX: usize = 254;

fn invalid(msg: &str) -> AppError {
    AppError::Validation(msg.to_string())
}

pub fn validate_email(email: &str) -> AppResult<()> {
    if email.len() > EMAIL_MAX || email.chars().any(char::is_whitespace) {
        return Err(invalid("invalid email"));
    }
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.') =>
        {
            Ok(())
        }
        _ => Err(invalid("invalid email")),
    }
}

pub fn validate_password(password: &str) -> AppResult<()> {
    let len = password.chars().count();
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) {
        return Err(invalid("password must be 8-20 characters"));
    }
    Ok(())
}

pub fn validate_nickname(nickname: &str) -> AppResult<()> {
    let len = nickname.chars().count();
    if len == 0 || len > NICKNAME_MAX || nickname.chars().any(char::is_whitespace) {
        return Err(invalid("nickname must be 1-10 characters without spaces"));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() || title.chars().count() > TITLE_MAX {
        return Err(invalid("title must be 1-26 characters"));
    }
    Ok(())
}

pub fn validate_content(content: &str) -> AppResult<()> {
    if content.trim().is_empty() {
        return Err(invalid("content must not be empty"));
    }
    Ok(())
}

impl LoginRequest {
    /// Only presence is checked; format rules would hint at which field was wrong.
    pub fn validate(&self) -> AppResult<()> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(invalid("email and password are required"));
        }
        Ok(())
    }
}

impl SignupRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        validate_nickname(&self.nickname)
    }
}

impl CreatePostRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate_title(&self.title)?;
        validate_content(&self.content)
    }
}

impl UpdatePostRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.title.is_none() && self.content.is_none() && self.image_url.is_none() {
            return Err(invalid("nothing to update"));
        }
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(content) = &self.content {
            validate_content(content)?;
        }
        Ok(())
    }
}

impl CommentRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate_content(&self.content)
    }
}

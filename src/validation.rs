//! Declarative request-body validation.
//!
//! A schema is a list of `(Field, Rule)` pairs checked against the raw JSON
//! body. Every violation is collected; an empty list means the body passed.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::{error::ApiError, response::Message};

/// A body key with its label in each language.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub key: &'static str,
    pub english: &'static str,
    pub portuguese: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub enum Rule {
    Text { required: bool, max_len: Option<usize> },
    Email { required: bool },
}

pub type Schema = &'static [(Field, Rule)];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: Message,
}

pub const NAME: Field = Field { key: "name", english: "name", portuguese: "nome" };
pub const EMAIL: Field = Field { key: "email", english: "email", portuguese: "e-mail" };
pub const PASSWORD: Field = Field { key: "password", english: "password", portuguese: "senha" };
pub const PHONE: Field = Field { key: "phone", english: "phone", portuguese: "telefone" };

pub const LOGIN: Schema = &[
    (EMAIL, Rule::Email { required: true }),
    (PASSWORD, Rule::Text { required: true, max_len: None }),
];

pub const INSERT_USER: Schema = &[
    (NAME, Rule::Text { required: true, max_len: Some(255) }),
    (EMAIL, Rule::Email { required: true }),
    (PASSWORD, Rule::Text { required: true, max_len: None }),
    (PHONE, Rule::Text { required: false, max_len: None }),
];

pub const UPDATE_USER: Schema = &[
    (NAME, Rule::Text { required: false, max_len: Some(255) }),
    (EMAIL, Rule::Email { required: false }),
    (PASSWORD, Rule::Text { required: false, max_len: None }),
    (PHONE, Rule::Text { required: false, max_len: None }),
];

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Checks `body` against `schema`, returning every violation found.
pub fn validate(schema: Schema, body: &Value) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if !body.is_object() {
        errors.push(FieldError {
            field: "body",
            message: Message::malformed_body(),
        });
        return errors;
    }

    for (field, rule) in schema {
        let value = match body.get(field.key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.as_str()),
            Some(_) => {
                errors.push(error(field, not_text(field)));
                continue;
            }
        };

        match *rule {
            Rule::Text { required, max_len } => {
                let value = value.map(str::trim);
                match value {
                    None | Some("") if required => errors.push(error(field, missing(field))),
                    Some(v) => {
                        if let Some(max) = max_len {
                            if v.chars().count() > max {
                                errors.push(error(field, too_long(field, max)));
                            }
                        }
                    }
                    None => {}
                }
            }
            Rule::Email { required } => match value.map(str::trim) {
                None | Some("") if required => errors.push(error(field, missing(field))),
                Some(v) if !is_valid_email(v) => {
                    errors.push(error(field, invalid_email()))
                }
                _ => {}
            },
        }
    }
    errors
}

/// Like [`validate`], but turns violations into an [`ApiError::Validation`].
pub fn check(schema: Schema, body: &Value) -> Result<(), ApiError> {
    let errors = validate(schema, body);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

fn error(field: &Field, message: Message) -> FieldError {
    FieldError {
        field: field.key,
        message,
    }
}

fn missing(field: &Field) -> Message {
    Message::new(
        format!("Enter the {}", field.english),
        format!("Informe o campo {}", field.portuguese),
    )
}

fn not_text(field: &Field) -> Message {
    Message::new(
        format!("The {} must be text", field.english),
        format!("O campo {} deve ser um texto", field.portuguese),
    )
}

fn too_long(field: &Field, max: usize) -> Message {
    Message::new(
        format!("The {} must have at most {max} characters", field.english),
        format!("O campo {} deve ter no máximo {max} caracteres", field.portuguese),
    )
}

fn invalid_email() -> Message {
    Message::new("Enter a valid email", "Informe um e-mail válido")
}

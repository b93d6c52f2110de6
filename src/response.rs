use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Human readable text sent to clients in both supported languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub english: String,
    pub portuguese: String,
}

impl Message {
    pub fn new(english: impl Into<String>, portuguese: impl Into<String>) -> Self {
        Self {
            english: english.into(),
            portuguese: portuguese.into(),
        }
    }

    pub fn success() -> Self {
        Self::new("Request successful", "Requisição realizada com sucesso")
    }

    /// Used for unknown ids and for every failed login.
    pub fn user_not_found() -> Self {
        Self::new("User not found", "Usuário não encontrado")
    }

    pub fn user_already_exists() -> Self {
        Self::new(
            "A user with this email already exists",
            "Já existe um usuário com este e-mail",
        )
    }

    pub fn unauthorized() -> Self {
        Self::new(
            "Unauthorized, please log in again",
            "Não autorizado, faça login novamente",
        )
    }

    /// `action` is the (english, portuguese) phrase for what was refused.
    pub fn forbidden(action: (&str, &str)) -> Self {
        Self::new(
            format!("You are not allowed to {}", action.0),
            format!("Você não tem permissão para {}", action.1),
        )
    }

    pub fn invalid_fields() -> Self {
        Self::new("Invalid fields", "Campos inválidos")
    }

    pub fn malformed_body() -> Self {
        Self::new("Malformed request body", "Corpo da requisição malformado")
    }

    pub fn unexpected() -> Self {
        Self::new(
            "Something went wrong, please try again later",
            "Algo deu errado, tente novamente mais tarde",
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Uniform JSON body shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: Status,
    pub message: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<T>,
}

/// Successful response: 200 with the success envelope.
#[derive(Debug)]
pub struct Success<T: Serialize>(pub Option<T>);

impl<T: Serialize> Success<T> {
    pub fn payload(payload: T) -> Self {
        Self(Some(payload))
    }
}

impl Success<()> {
    pub fn empty() -> Self {
        Self(None)
    }
}

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            status: Status::Success,
            message: Message::success(),
            payload: self.0,
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_success_envelope_has_no_payload_key() {
        let body = Envelope::<()> {
            status: Status::Success,
            message: Message::success(),
            payload: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "success");
        assert!(json.get("payload").is_none());
        assert!(json["message"]["english"].is_string());
        assert!(json["message"]["portuguese"].is_string());
    }

    #[test]
    fn forbidden_message_names_the_action() {
        let msg = Message::forbidden(("delete this user", "deletar este usuário"));
        assert_eq!(msg.english, "You are not allowed to delete this user");
        assert_eq!(msg.portuguese, "Você não tem permissão para deletar este usuário");
    }
}

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
};
use tracing::error;

pub struct AppError {
	pub error: anyhow::Error,
	pub status_code: StatusCode,
}

impl AppError {
	pub fn new(error: anyhow::Error, status_code: StatusCode) -> Self {
		Self { error, status_code }
	}

	#[inline]
	pub fn bad_request(message: &'static str) -> Self {
		Self::new(anyhow::anyhow!(message), StatusCode::BAD_REQUEST)
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response {
		if self.status_code.is_client_error() {
			return (self.status_code, format!("{}", self.error)).into_response();
		}

		error!("Request failed: {:#}", self.error);
		(
			self.status_code,
			format!("Something went wrong: {}", self.error),
		)
			.into_response()
	}
}

impl<E> From<E> for AppError
where
	E: Into<anyhow::Error>,
{
	fn from(err: E) -> Self {
		Self::new(err.into(), StatusCode::INTERNAL_SERVER_ERROR)
	}
}

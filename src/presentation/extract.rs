// Extractors whose rejections go through `ApiError`
use crate::domain::date::{DateRange, DateRangeError};
use crate::presentation::error::ApiError;
use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

/// `start_date` / `end_date` query parameters. A repeated key keeps its
/// first value; unknown keys are ignored.
#[derive(Debug, Default)]
pub struct DateQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DateQuery {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "start_date" => &mut query.start_date,
                "end_date" => &mut query.end_date,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }

    pub fn range(&self) -> Result<DateRange, DateRangeError> {
        DateRange::from_query(self.start_date.as_deref(), self.end_date.as_deref())
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for DateQuery {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state).await?;
        Ok(Self::from_pairs(pairs))
    }
}

/// `axum::Json` with a JSON error body on rejection
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(request, state).await?;
        Ok(Self(value))
    }
}

/// `axum::extract::Path` with a JSON error body on rejection
pub struct PathParam<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

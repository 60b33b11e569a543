use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::accounting::DEFAULT_TOKEN;
use crate::http::response::ApiError;
use crate::security::{check_call_limit, first_param, API_KEY_PARAM};
use crate::weather::WeatherState;

/// Payload of `GET /api/weather`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub test: i64,
    pub name: String,
    /// Fixed demo field; not a live counter.
    pub counter: u64,
    pub call_count: u64,
}

impl WeatherReport {
    pub fn new(call_count: u64) -> Self {
        Self {
            test: 123,
            name: "testname".to_string(),
            counter: 0,
            call_count,
        }
    }
}

/// Payload of `GET /api/customers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerList {
    pub customers: Vec<String>,
}

pub async fn index() -> Html<&'static str> {
    Html("<p>Hello, World!</p>")
}

pub async fn get_weather(
    State(state): State<WeatherState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<WeatherReport>, ApiError> {
    let api_key = first_param(&params, API_KEY_PARAM).unwrap_or(DEFAULT_TOKEN);

    let call_count = state.accounting.increment_and_get(api_key).await?;
    check_call_limit(call_count)?;

    Ok(Json(WeatherReport::new(call_count)))
}

pub async fn get_customers() -> Json<CustomerList> {
    Json(CustomerList {
        customers: ["alvin", "diane", "derick"]
            .into_iter()
            .map(String::from)
            .collect(),
    })
}

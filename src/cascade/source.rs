//! Vehicle guide options from the stored procedures

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::gateway::procedures::{
    guide_year_args, guide_year_type_args, DISTINCT_GUIDE_YEARS, MAKES_BY_GUIDE_YEAR_TYPE,
    TYPES_BY_GUIDE_YEAR,
};
use crate::gateway::{GatewayError, GatewayResult, SessionGateway};

use super::driver::OptionSource;
use super::options::{FilterSet, OptionList};

/// Options for the `guide_year → type → make` chain
#[derive(Clone)]
pub struct GatewayOptionSource {
    gateway: SessionGateway,
}

impl GatewayOptionSource {
    pub fn new(gateway: SessionGateway) -> Self {
        Self { gateway }
    }
}

fn rows(payload: Value) -> GatewayResult<Vec<Value>> {
    match payload {
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        other => Err(GatewayError::Decode(format!(
            "expected a list of options, got {other}"
        ))),
    }
}

fn guide_year(scope: &FilterSet) -> GatewayResult<i64> {
    scope
        .scalar("guide_year")
        .and_then(|year| year.as_i64())
        .ok_or_else(|| GatewayError::InvalidRequest("guide_year is required".to_string()))
}

#[async_trait]
impl OptionSource for GatewayOptionSource {
    async fn options(&self, key: &str, scope: &FilterSet) -> GatewayResult<OptionList> {
        match key {
            "guide_year" => {
                let payload = self.gateway.call(DISTINCT_GUIDE_YEARS, json!({})).await?;
                Ok(OptionList::from_rows(&rows(payload)?, Some("year")))
            }
            "type" => {
                let args = guide_year_args(guide_year(scope)?);
                let payload = self.gateway.call(TYPES_BY_GUIDE_YEAR, args).await?;
                Ok(OptionList::from_rows(&rows(payload)?, None))
            }
            "make" => {
                let vehicle_type = scope.scalar("type").and_then(|t| t.as_str());
                let args = guide_year_type_args(guide_year(scope)?, vehicle_type);
                let payload = self.gateway.call(MAKES_BY_GUIDE_YEAR_TYPE, args).await?;
                Ok(OptionList::from_rows(&rows(payload)?, Some("make")))
            }
            other => Err(GatewayError::InvalidRequest(format!(
                "no option lookup for {other}"
            ))),
        }
    }
}

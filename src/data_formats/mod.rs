mod request;
mod response;
mod wrapper;

pub use request::*;
pub use response::*;
pub use wrapper::*;

use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Default)]
pub struct PostQueryParams {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default = "get_default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct PageParams {
    #[serde(default = "get_default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub cursor: Option<String>,
}

fn get_default_limit() -> u32 {
    20
}

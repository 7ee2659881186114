use serde::Deserialize;

// 创建教材（存储层输入，图片已上传完成）
#[derive(Debug, Clone)]
pub struct CreateBookRequest {
    pub id: String,
    pub name: String,
    pub book_type: String,
    pub price: f64,
    pub describe: Option<String>,
    pub image: Option<String>,
    pub badge: Option<String>,
    pub topics: Vec<String>,
}

// 更新教材（存储层输入）
//
// image / badge 为 None 时保留原值
#[derive(Debug, Clone)]
pub struct UpdateBookRequest {
    pub name: String,
    pub price: f64,
    pub describe: Option<String>,
    pub image: Option<String>,
    pub badge: Option<String>,
}

/// Topics 字段既可以是字符串数组，也可以是 `{ "Name": ... }` 对象数组
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TopicInput {
    Name(String),
    Object {
        #[serde(rename = "Name", alias = "name")]
        name: String,
    },
}

/// 解析表单中的 Topics JSON，空字符串视为空列表
pub fn parse_topics(raw: Option<&str>) -> Result<Vec<String>, serde_json::Error> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Vec::new());
    };
    let topics: Vec<TopicInput> = serde_json::from_str(raw)?;
    Ok(topics
        .into_iter()
        .map(|t| match t {
            TopicInput::Name(name) | TopicInput::Object { name } => name.trim().to_string(),
        })
        .filter(|name| !name.is_empty())
        .collect())
}

/// 价格解析失败或非有限数时回退为 0
pub fn parse_price(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|p| p.is_finite())
        .unwrap_or(0.0)
}

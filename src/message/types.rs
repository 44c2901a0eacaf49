//! 消息类型定义
//!
//! 钉钉机器人支持的消息类型、必填项校验以及请求体转换

use crate::error::DingError;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// 普通文本消息
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Text {
    /// 消息内容，必填
    pub content: String,
    /// 被@人的手机号
    pub at_mobiles: Vec<String>,
    /// 被@人的用户ID
    pub at_user_ids: Vec<String>,
    /// 是否@所有人
    pub at_all: bool,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// 链接消息
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Link {
    /// 标题，必填
    pub title: String,
    /// 消息内容，必填
    pub content: String,
    /// 点击消息跳转的URL，必填
    pub message_url: String,
    /// 图片URL
    pub picture_url: String,
}

/// markdown 消息
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Markdown {
    /// 标题，必填
    pub title: String,
    /// markdown 内容，必填
    pub content: String,
}

impl Markdown {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// 整体跳转的 ActionCard
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverallActionCard {
    pub title: String,
    pub content: String,
    /// 单个按钮的标题
    pub button_title: String,
    /// 点击按钮跳转的URL
    pub button_url: String,
    /// 按钮横向排列
    pub button_horizontal: bool,
}

/// ActionCard 按钮
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionButton {
    pub title: String,
    pub action_url: String,
}

/// 独立跳转的 ActionCard
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndependentActionCard {
    pub title: String,
    pub content: String,
    pub buttons: Vec<ActionButton>,
    pub button_horizontal: bool,
}

/// FeedCard 中的单条链接
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedLink {
    pub title: String,
    pub message_url: String,
    pub picture_url: String,
}

/// FeedCard 消息
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedCard {
    pub links: Vec<FeedLink>,
}

/// 可发送的消息
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Text(Text),
    Link(Link),
    Markdown(Markdown),
    OverallActionCard(OverallActionCard),
    IndependentActionCard(IndependentActionCard),
    FeedCard(FeedCard),
}

/// 消息类型，对应请求体中的 `msgtype`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Link,
    Markdown,
    ActionCard,
    FeedCard,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Link => "link",
            MessageKind::Markdown => "markdown",
            MessageKind::ActionCard => "actionCard",
            MessageKind::FeedCard => "feedCard",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = DingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(MessageKind::Text),
            "link" => Ok(MessageKind::Link),
            "markdown" => Ok(MessageKind::Markdown),
            "actionCard" => Ok(MessageKind::ActionCard),
            "feedCard" => Ok(MessageKind::FeedCard),
            other => Err(DingError::UnsupportedType(other.to_string())),
        }
    }
}

fn require(value: &str, field: &str) -> Result<(), DingError> {
    if value.is_empty() {
        return Err(DingError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn btn_orientation(horizontal: bool) -> &'static str {
    if horizontal {
        "1"
    } else {
        "0"
    }
}

impl Message {
    /// 消息的 `msgtype`
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Text(_) => MessageKind::Text,
            Message::Link(_) => MessageKind::Link,
            Message::Markdown(_) => MessageKind::Markdown,
            Message::OverallActionCard(_) | Message::IndependentActionCard(_) => {
                MessageKind::ActionCard
            }
            Message::FeedCard(_) => MessageKind::FeedCard,
        }
    }

    /// 检查必填项目
    pub fn validate(&self) -> Result<(), DingError> {
        match self {
            Message::Text(m) => require(&m.content, "content"),
            Message::Link(m) => {
                require(&m.content, "content")?;
                require(&m.title, "title")?;
                require(&m.message_url, "message_url")
            }
            Message::Markdown(m) => {
                require(&m.content, "content")?;
                require(&m.title, "title")
            }
            Message::OverallActionCard(m) => {
                require(&m.content, "content")?;
                require(&m.title, "title")?;
                require(&m.button_title, "button_title")?;
                require(&m.button_url, "button_url")
            }
            Message::IndependentActionCard(m) => {
                require(&m.content, "content")?;
                require(&m.title, "title")?;
                if m.buttons.is_empty() {
                    return Err(DingError::Validation("buttons is required".to_string()));
                }
                for button in &m.buttons {
                    require(&button.title, "buttons.title")?;
                    require(&button.action_url, "buttons.action_url")?;
                }
                Ok(())
            }
            Message::FeedCard(m) => {
                if m.links.is_empty() {
                    return Err(DingError::Validation("links is required".to_string()));
                }
                for link in &m.links {
                    require(&link.title, "links.title")?;
                    require(&link.message_url, "links.message_url")?;
                }
                Ok(())
            }
        }
    }

    /// 转换为钉钉接口的请求体
    pub fn to_payload(&self) -> Value {
        match self {
            Message::Text(m) => json!({
                "msgtype": "text",
                "text": { "content": m.content },
                "at": {
                    "atMobiles": m.at_mobiles,
                    "atUserIds": m.at_user_ids,
                    "isAtAll": m.at_all
                }
            }),
            Message::Link(m) => json!({
                "msgtype": "link",
                "link": {
                    "text": m.content,
                    "title": m.title,
                    "picUrl": m.picture_url,
                    "messageUrl": m.message_url
                }
            }),
            Message::Markdown(m) => json!({
                "msgtype": "markdown",
                "markdown": { "text": m.content, "title": m.title }
            }),
            Message::OverallActionCard(m) => json!({
                "msgtype": "actionCard",
                "actionCard": {
                    "text": m.content,
                    "title": m.title,
                    "singleTitle": m.button_title,
                    "singleURL": m.button_url,
                    "btnOrientation": btn_orientation(m.button_horizontal)
                }
            }),
            Message::IndependentActionCard(m) => {
                let btns: Vec<Value> = m
                    .buttons
                    .iter()
                    .map(|b| json!({ "title": b.title, "actionURL": b.action_url }))
                    .collect();
                json!({
                    "msgtype": "actionCard",
                    "actionCard": {
                        "text": m.content,
                        "title": m.title,
                        "btns": btns,
                        "btnOrientation": btn_orientation(m.button_horizontal)
                    }
                })
            }
            Message::FeedCard(m) => {
                let links: Vec<Value> = m
                    .links
                    .iter()
                    .map(|l| {
                        json!({
                            "title": l.title,
                            "messageURL": l.message_url,
                            "picURL": l.picture_url
                        })
                    })
                    .collect();
                json!({
                    "msgtype": "feedCard",
                    "feedCard": { "links": links }
                })
            }
        }
    }
}

impl From<Text> for Message {
    fn from(m: Text) -> Self {
        Message::Text(m)
    }
}

impl From<Link> for Message {
    fn from(m: Link) -> Self {
        Message::Link(m)
    }
}

impl From<Markdown> for Message {
    fn from(m: Markdown) -> Self {
        Message::Markdown(m)
    }
}

impl From<OverallActionCard> for Message {
    fn from(m: OverallActionCard) -> Self {
        Message::OverallActionCard(m)
    }
}

impl From<IndependentActionCard> for Message {
    fn from(m: IndependentActionCard) -> Self {
        Message::IndependentActionCard(m)
    }
}

impl From<FeedCard> for Message {
    fn from(m: FeedCard) -> Self {
        Message::FeedCard(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_requires_content() {
        let message = Message::from(Text::new(""));
        let err = message.validate().unwrap_err();
        assert!(matches!(err, DingError::Validation(_)));
        assert!(err.to_string().contains("content"));
    }

    #[test]
    fn test_link_requires_message_url() {
        let message = Message::from(Link {
            title: "发布".to_string(),
            content: "v1.2.0 已发布".to_string(),
            message_url: String::new(),
            picture_url: String::new(),
        });
        assert!(message.validate().is_err());
    }

    #[test]
    fn test_independent_action_card_requires_buttons() {
        let mut card = IndependentActionCard {
            title: "审批".to_string(),
            content: "请处理".to_string(),
            buttons: vec![],
            button_horizontal: false,
        };
        assert!(Message::from(card.clone()).validate().is_err());

        card.buttons.push(ActionButton {
            title: "同意".to_string(),
            action_url: "https://example.com/ok".to_string(),
        });
        assert!(Message::from(card).validate().is_ok());
    }

    #[test]
    fn test_text_payload() {
        let message = Message::from(Text {
            content: "hello".to_string(),
            at_mobiles: vec!["13800000000".to_string()],
            at_user_ids: vec![],
            at_all: true,
        });

        assert_eq!(
            message.to_payload(),
            json!({
                "msgtype": "text",
                "text": { "content": "hello" },
                "at": { "atMobiles": ["13800000000"], "atUserIds": [], "isAtAll": true }
            })
        );
    }

    #[test]
    fn test_blank_content_is_present() {
        // 只有空白的内容不算缺失
        assert!(Message::from(Markdown::new("t", "\n\n")).validate().is_ok());
        assert!(Message::from(Text::new(" ")).validate().is_ok());
        assert!(Message::from(Markdown::new("t", "")).validate().is_err());
    }

    #[test]
    fn test_link_payload() {
        let message = Message::from(Link {
            title: "新版本".to_string(),
            content: "v2 已发布".to_string(),
            message_url: "https://example.com/release".to_string(),
            picture_url: "https://example.com/logo.png".to_string(),
        });

        assert_eq!(
            message.to_payload(),
            json!({
                "msgtype": "link",
                "link": {
                    "text": "v2 已发布",
                    "title": "新版本",
                    "picUrl": "https://example.com/logo.png",
                    "messageUrl": "https://example.com/release"
                }
            })
        );
    }

    #[test]
    fn test_markdown_payload() {
        let message = Message::from(Markdown::new("日报", "## 今日\n- 完成"));

        assert_eq!(
            message.to_payload(),
            json!({
                "msgtype": "markdown",
                "markdown": { "text": "## 今日\n- 完成", "title": "日报" }
            })
        );
    }

    #[test]
    fn test_overall_action_card_payload() {
        let message = Message::from(OverallActionCard {
            title: "t".to_string(),
            content: "c".to_string(),
            button_title: "查看".to_string(),
            button_url: "https://example.com".to_string(),
            button_horizontal: true,
        });

        assert_eq!(
            message.to_payload(),
            json!({
                "msgtype": "actionCard",
                "actionCard": {
                    "text": "c",
                    "title": "t",
                    "singleTitle": "查看",
                    "singleURL": "https://example.com",
                    "btnOrientation": "1"
                }
            })
        );
    }

    #[test]
    fn test_independent_action_card_payload() {
        let message = Message::from(IndependentActionCard {
            title: "审批".to_string(),
            content: "请处理".to_string(),
            buttons: vec![
                ActionButton {
                    title: "同意".to_string(),
                    action_url: "https://example.com/ok".to_string(),
                },
                ActionButton {
                    title: "拒绝".to_string(),
                    action_url: "https://example.com/no".to_string(),
                },
            ],
            button_horizontal: false,
        });

        assert_eq!(
            message.to_payload(),
            json!({
                "msgtype": "actionCard",
                "actionCard": {
                    "text": "请处理",
                    "title": "审批",
                    "btns": [
                        { "title": "同意", "actionURL": "https://example.com/ok" },
                        { "title": "拒绝", "actionURL": "https://example.com/no" }
                    ],
                    "btnOrientation": "0"
                }
            })
        );
    }

    #[test]
    fn test_feed_card_payload() {
        let message = Message::from(FeedCard {
            links: vec![FeedLink {
                title: "a".to_string(),
                message_url: "https://example.com/a".to_string(),
                picture_url: "https://example.com/a.png".to_string(),
            }],
        });

        assert_eq!(
            message.to_payload(),
            json!({
                "msgtype": "feedCard",
                "feedCard": { "links": [{
                    "title": "a",
                    "messageURL": "https://example.com/a",
                    "picURL": "https://example.com/a.png"
                }] }
            })
        );
    }

    #[test]
    fn test_message_kind_from_str() {
        assert_eq!("actionCard".parse::<MessageKind>().unwrap(), MessageKind::ActionCard);
        assert!(matches!(
            "voice".parse::<MessageKind>(),
            Err(DingError::UnsupportedType(name)) if name == "voice"
        ));
    }
}

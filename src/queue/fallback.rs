//! 合并消息发送失败后的兜底通知

use crate::message::Text;
use crate::notification::MessageSender;
use std::sync::Arc;
use tracing::{error, info};

/// 兜底通知内容
pub const FALLBACK_NOTICE: &str = "消息太长，请通过其他途径查看，比如邮件";

/// 兜底通知发送器
///
/// 只发送一次，不重试，失败仅记录日志。
#[derive(Clone)]
pub struct FallbackNotifier {
    sender: Arc<dyn MessageSender>,
}

impl FallbackNotifier {
    pub fn new(sender: Arc<dyn MessageSender>) -> Self {
        Self { sender }
    }

    pub async fn notify(&self) {
        let result = self.sender.send(&Text::new(FALLBACK_NOTICE).into()).await;
        if result.success {
            info!("兜底通知发送成功");
        } else {
            error!("兜底通知发送失败: {}", result.err_msg);
        }
    }
}

//! 通知分发
//!
//! 邮件通知经由有界队列交给独立 worker 发送：
//! 入队失败（队列满/已关闭）只告警丢弃，不影响请求路径；
//! 关闭时随发送端 drop 自然排空队列后退出

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use manikura_adapter_email::{EmailSender, EmailTemplate};
use manikura_errors::AppResult;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// 通知任务
#[derive(Debug, Clone)]
pub enum NotificationJob {
    /// 预约确认
    BookingConfirmation {
        to: String,
        user_name: String,
        salon_name: String,
        appointment_date: DateTime<Utc>,
        service: String,
        price: f64,
    },
    /// 24 小时提醒
    Reminder24h {
        to: String,
        user_name: String,
        salon_name: String,
        appointment_date: DateTime<Utc>,
        service: String,
    },
}

/// 通知入队句柄
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<NotificationJob>,
}

impl Notifier {
    /// 预约确认邮件（尽力而为）
    pub fn send_booking_confirmation(
        &self,
        to: impl Into<String>,
        user_name: impl Into<String>,
        salon_name: impl Into<String>,
        appointment_date: DateTime<Utc>,
        service: impl Into<String>,
        price: f64,
    ) {
        self.enqueue(NotificationJob::BookingConfirmation {
            to: to.into(),
            user_name: user_name.into(),
            salon_name: salon_name.into(),
            appointment_date,
            service: service.into(),
            price,
        });
    }

    /// 24 小时提醒邮件（尽力而为；当前没有定时器触发它）
    pub fn send_24h_reminder(
        &self,
        to: impl Into<String>,
        user_name: impl Into<String>,
        salon_name: impl Into<String>,
        appointment_date: DateTime<Utc>,
        service: impl Into<String>,
    ) {
        self.enqueue(NotificationJob::Reminder24h {
            to: to.into(),
            user_name: user_name.into(),
            salon_name: salon_name.into(),
            appointment_date,
            service: service.into(),
        });
    }

    fn enqueue(&self, job: NotificationJob) {
        if let Err(e) = self.tx.try_send(job) {
            warn!(error = %e, "Notification queue full or closed, dropping job");
        }
    }
}

/// 通知 worker
///
/// 所有 `Notifier` 句柄 drop 后，队列排空即退出
pub struct NotificationWorker {
    rx: mpsc::Receiver<NotificationJob>,
    sender: Arc<dyn EmailSender>,
    templates: EmailTemplate,
}

impl NotificationWorker {
    pub async fn run(mut self) {
        info!("Notification worker started");

        while let Some(job) = self.rx.recv().await {
            if let Err(e) = self.handle(job).await {
                // 发送失败只记录，从不上抛，也不重试
                warn!(error = %e, "Failed to send notification email");
            }
        }

        info!("Notification queue drained, worker stopping");
    }

    async fn handle(&self, job: NotificationJob) -> AppResult<()> {
        match job {
            NotificationJob::BookingConfirmation {
                to,
                user_name,
                salon_name,
                appointment_date,
                service,
                price,
            } => {
                let date = format_appointment(appointment_date);
                let (html, text) = self.templates.render_booking_confirmation(
                    &user_name,
                    &salon_name,
                    &date,
                    &service,
                    price,
                )?;
                let subject =
                    format!("✅ Confirmation de votre réservation chez {}", salon_name);

                self.sender
                    .send_html_email(&to, &subject, &html, Some(&text))
                    .await
            }
            NotificationJob::Reminder24h {
                to,
                user_name,
                salon_name,
                appointment_date,
                service,
            } => {
                let date = format_appointment(appointment_date);
                let (html, text) = self.templates.render_reminder_24h(
                    &user_name,
                    &salon_name,
                    &date,
                    &service,
                )?;
                let subject = format!(
                    "⏰ Rappel : Votre rendez-vous chez {} demain",
                    salon_name
                );

                self.sender
                    .send_html_email(&to, &subject, &html, Some(&text))
                    .await
            }
        }
    }
}

/// 创建通知队列与 worker
pub fn notification_channel(
    capacity: usize,
    sender: Arc<dyn EmailSender>,
    templates: EmailTemplate,
) -> (Notifier, NotificationWorker) {
    let (tx, rx) = mpsc::channel(capacity);

    (
        Notifier { tx },
        NotificationWorker {
            rx,
            sender,
            templates,
        },
    )
}

/// 内置邮件模板
pub fn default_templates() -> AppResult<EmailTemplate> {
    let mut templates = HashMap::new();
    templates.insert(
        "booking_confirmation.html".to_string(),
        include_str!("../../templates/booking_confirmation.html").to_string(),
    );
    templates.insert(
        "booking_confirmation.txt".to_string(),
        include_str!("../../templates/booking_confirmation.txt").to_string(),
    );
    templates.insert(
        "reminder_24h.html".to_string(),
        include_str!("../../templates/reminder_24h.html").to_string(),
    );
    templates.insert(
        "reminder_24h.txt".to_string(),
        include_str!("../../templates/reminder_24h.txt").to_string(),
    );

    EmailTemplate::from_strings(templates)
}

fn format_appointment(date: DateTime<Utc>) -> String {
    date.format("%d/%m/%Y à %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_templates_render() {
        let templates = default_templates().unwrap();

        let (html, text) = templates
            .render_booking_confirmation("Sophie", "Ongles & Co", "14/02/2026 à 10:00", "manucure", 45.0)
            .unwrap();

        assert!(html.contains("Sophie"));
        assert!(html.contains("Ongles & Co"));
        assert!(text.contains("manucure"));

        let (html, _) = templates
            .render_reminder_24h("Sophie", "Ongles & Co", "14/02/2026 à 10:00", "manucure")
            .unwrap();
        assert!(html.contains("demain") || html.contains("Rappel"));
    }

    #[test]
    fn test_format_appointment() {
        let date = Utc.with_ymd_and_hms(2026, 2, 14, 10, 30, 0).unwrap();
        assert_eq!(format_appointment(date), "14/02/2026 à 10:30");
    }
}

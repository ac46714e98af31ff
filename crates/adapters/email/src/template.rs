//! 邮件模板系统

use manikura_errors::{AppError, AppResult};
use std::collections::HashMap;
use tera::Tera;
use tracing::debug;

/// 邮件模板管理器
pub struct EmailTemplate {
    tera: Tera,
}

impl EmailTemplate {
    /// 创建新的模板管理器
    pub fn new(template_dir: &str) -> AppResult<Self> {
        let pattern = format!("{}/**/*", template_dir);
        let tera = Tera::new(&pattern)
            .map_err(|e| AppError::internal(format!("Failed to load email templates: {}", e)))?;

        debug!(template_dir = %template_dir, "Email templates loaded");

        Ok(Self { tera })
    }

    /// 从内存中的模板字符串创建
    pub fn from_strings(templates: HashMap<String, String>) -> AppResult<Self> {
        let mut tera = Tera::default();

        for (name, content) in templates {
            tera.add_raw_template(&name, &content).map_err(|e| {
                AppError::internal(format!("Failed to add template {}: {}", name, e))
            })?;
        }

        Ok(Self { tera })
    }

    /// 渲染模板
    pub fn render(&self, template_name: &str, context: &serde_json::Value) -> AppResult<String> {
        let context = tera::Context::from_serialize(context)
            .map_err(|e| AppError::internal(format!("Failed to create template context: {}", e)))?;

        self.tera.render(template_name, &context).map_err(|e| {
            AppError::internal(format!("Failed to render template {}: {}", template_name, e))
        })
    }

    /// 渲染预约确认邮件
    pub fn render_booking_confirmation(
        &self,
        user_name: &str,
        salon_name: &str,
        appointment_date: &str,
        service: &str,
        price: f64,
    ) -> AppResult<(String, String)> {
        let mut context = tera::Context::new();
        context.insert("user_name", user_name);
        context.insert("salon_name", salon_name);
        context.insert("appointment_date", appointment_date);
        context.insert("service", service);
        context.insert("price", &price);

        // 渲染 HTML 版本
        let html = self
            .tera
            .render("booking_confirmation.html", &context)
            .map_err(|e| AppError::internal(format!("Failed to render HTML template: {}", e)))?;

        // 渲染纯文本版本
        let text = self
            .tera
            .render("booking_confirmation.txt", &context)
            .map_err(|e| AppError::internal(format!("Failed to render text template: {}", e)))?;

        Ok((html, text))
    }

    /// 渲染 24 小时提醒邮件
    pub fn render_reminder_24h(
        &self,
        user_name: &str,
        salon_name: &str,
        appointment_date: &str,
        service: &str,
    ) -> AppResult<(String, String)> {
        let mut context = tera::Context::new();
        context.insert("user_name", user_name);
        context.insert("salon_name", salon_name);
        context.insert("appointment_date", appointment_date);
        context.insert("service", service);

        let html = self
            .tera
            .render("reminder_24h.html", &context)
            .map_err(|e| AppError::internal(format!("Failed to render HTML template: {}", e)))?;

        let text = self
            .tera
            .render("reminder_24h.txt", &context)
            .map_err(|e| AppError::internal(format!("Failed to render text template: {}", e)))?;

        Ok((html, text))
    }
}

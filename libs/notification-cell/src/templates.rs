//! Handlebars templates for appointment emails.

use handlebars::Handlebars;
use serde_json::{json, Value};

use shared_models::clock::{format_12h, format_long_date};
use shared_models::notification::{CancelledBy, NotificationData, NotificationError, NotificationKind};

use crate::provider::Email;

const DETAILS: &str = r#"<ul>
  <li><strong>Service:</strong> {{serviceName}}</li>
  <li><strong>Date:</strong> {{date}}</li>
  <li><strong>Time:</strong> {{time}}</li>
  <li><strong>Duration:</strong> {{duration}} minutes</li>
</ul>"#;

const NEW_APPOINTMENT: &str = r#"<h2>New Appointment Request</h2>
<p>Dear Dr. {{dentistName}},</p>
<p>You have received a new appointment request from <strong>{{patientName}}</strong>.</p>
{{> details}}
{{#if notes}}<p><strong>Patient notes:</strong> {{notes}}</p>{{/if}}
<p>Please log in to your <a href="{{frontendUrl}}/dentist/appointments">dashboard</a> to review and approve this appointment.</p>"#;

const APPROVED: &str = r#"<h2>Appointment Confirmed!</h2>
<p>Dear {{patientName}},</p>
<p>Great news! Your appointment has been confirmed by Dr. {{dentistName}}.</p>
{{> details}}
<p>Please arrive 10 minutes early. If you need to cancel or reschedule, do so at least 24 hours in advance.</p>"#;

const COMPLETED: &str = r#"<h2>Thank You for Your Visit!</h2>
<p>Dear {{patientName}},</p>
<p>Thank you for choosing DentalCare+ for your dental needs. We hope you had a positive experience with Dr. {{dentistName}}.</p>
{{> details}}
<p>You can book your next visit from <a href="{{frontendUrl}}/patient/book">your account</a>.</p>"#;

const NO_SHOW: &str = r#"<h2>Missed Appointment</h2>
<p>Dear {{patientName}},</p>
<p>We noticed that you missed your scheduled appointment with Dr. {{dentistName}}. We understand that unexpected circumstances can arise.</p>
{{> details}}
<p>Would you like to reschedule? <a href="{{frontendUrl}}/patient/book">Book a new time</a>.</p>"#;

const CANCELLED: &str = r#"<h2>Appointment Cancelled</h2>
<p>Dear {{patientName}},</p>
<p>This is to confirm that your appointment has been cancelled {{#if cancelledByPatient}}as requested{{else}}by Dr. {{dentistName}}{{/if}}.</p>
{{> details}}
<p>We hope to see you again soon.</p>"#;

const RESCHEDULE_TO_DENTIST: &str = r#"<h2>Appointment Rescheduled</h2>
<p>Dear Dr. {{dentistName}},</p>
<p><strong>{{patientName}}</strong> has moved their appointment from {{previousDate}} at {{previousTime}} to the time below. It is awaiting your approval.</p>
{{> details}}"#;

const RESCHEDULE_TO_PATIENT: &str = r#"<h2>Your Appointment Has Been Rescheduled</h2>
<p>Dear {{patientName}},</p>
<p>Your appointment with Dr. {{dentistName}} has been moved from {{previousDate}} at {{previousTime}}. Dr. {{dentistName}} will confirm the new time shortly.</p>
{{> details}}"#;

const TEMPLATES: [(&str, &str); 7] = [
    ("new-appointment", NEW_APPOINTMENT),
    ("approved", APPROVED),
    ("completed", COMPLETED),
    ("no-show", NO_SHOW),
    ("cancelled", CANCELLED),
    ("reschedule-dentist", RESCHEDULE_TO_DENTIST),
    ("reschedule-patient", RESCHEDULE_TO_PATIENT),
];

pub fn subject_for(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::NewAppointmentToDentist => "New Appointment Request - DentalCare+",
        NotificationKind::ApprovedToPatient => "Appointment Confirmed - DentalCare+",
        NotificationKind::CompletedThankYou => "Thank You for Your Visit - DentalCare+",
        NotificationKind::NoShowReschedule => "Missed Appointment - Reschedule Request",
        NotificationKind::CancellationConfirmation { .. } => "Appointment Cancelled - DentalCare+",
        NotificationKind::RescheduleToDentist => "Appointment Rescheduled - DentalCare+",
        NotificationKind::RescheduleToPatient => "Your Appointment Has Been Rescheduled - DentalCare+",
    }
}

fn template_for(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::NewAppointmentToDentist => "new-appointment",
        NotificationKind::ApprovedToPatient => "approved",
        NotificationKind::CompletedThankYou => "completed",
        NotificationKind::NoShowReschedule => "no-show",
        NotificationKind::CancellationConfirmation { .. } => "cancelled",
        NotificationKind::RescheduleToDentist => "reschedule-dentist",
        NotificationKind::RescheduleToPatient => "reschedule-patient",
    }
}

pub struct TemplateEngine {
    registry: Handlebars<'static>,
    frontend_url: String,
}

impl TemplateEngine {
    pub fn new(frontend_url: impl Into<String>) -> Result<Self, NotificationError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry
            .register_partial("details", DETAILS)
            .map_err(|e| NotificationError::Template(e.to_string()))?;
        for (name, source) in TEMPLATES {
            registry
                .register_template_string(name, source)
                .map_err(|e| NotificationError::Template(format!("{}: {}", name, e)))?;
        }

        Ok(Self {
            registry,
            frontend_url: frontend_url.into(),
        })
    }

    fn context(&self, kind: NotificationKind, data: &NotificationData) -> Value {
        json!({
            "recipientName": data.recipient_name,
            "patientName": data.patient_name,
            "dentistName": data.dentist_name,
            "serviceName": data.service_name,
            "date": format_long_date(data.date),
            "time": format_12h(data.time),
            "duration": data.duration,
            "notes": data.notes,
            "previousDate": data.previous_date.map(format_long_date),
            "previousTime": data.previous_time.map(format_12h),
            "cancelledByPatient": matches!(
                kind,
                NotificationKind::CancellationConfirmation { by: CancelledBy::Patient }
            ),
            "frontendUrl": self.frontend_url,
        })
    }

    pub fn render(
        &self,
        kind: NotificationKind,
        recipient_email: &str,
        data: &NotificationData,
    ) -> Result<Email, NotificationError> {
        let context = self.context(kind, data);
        let body_html = self
            .registry
            .render(template_for(kind), &context)
            .map_err(|e| NotificationError::Template(e.to_string()))?;

        Ok(Email {
            to: recipient_email.to_string(),
            subject: subject_for(kind).to_string(),
            body_text: strip_tags(&body_html),
            body_html,
        })
    }
}

fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn data() -> NotificationData {
        NotificationData {
            recipient_name: "Pat".to_string(),
            patient_name: "Pat Lee".to_string(),
            dentist_name: "Molar".to_string(),
            service_name: "Cleaning".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
            duration: 30,
            notes: String::new(),
            previous_date: NaiveDate::from_ymd_opt(2024, 1, 10),
            previous_time: NaiveTime::from_hms_opt(9, 0, 0),
        }
    }

    #[test]
    fn renders_formatted_date_and_time() {
        let engine = TemplateEngine::new("http://localhost:3000").unwrap();
        let email = engine
            .render(NotificationKind::ApprovedToPatient, "pat@example.com", &data())
            .unwrap();

        assert_eq!(email.subject, "Appointment Confirmed - DentalCare+");
        assert!(email.body_html.contains("Monday, January 15, 2024"));
        assert!(email.body_html.contains("2:30 PM"));
        assert!(!email.body_text.contains('<'));
    }

    #[test]
    fn cancellation_wording_depends_on_who_cancelled() {
        let engine = TemplateEngine::new("http://localhost:3000").unwrap();
        let by_patient = engine
            .render(
                NotificationKind::CancellationConfirmation { by: CancelledBy::Patient },
                "pat@example.com",
                &data(),
            )
            .unwrap();
        let by_dentist = engine
            .render(
                NotificationKind::CancellationConfirmation { by: CancelledBy::Dentist },
                "pat@example.com",
                &data(),
            )
            .unwrap();

        assert!(by_patient.body_html.contains("as requested"));
        assert!(by_dentist.body_html.contains("by Dr. Molar"));
    }

    #[test]
    fn reschedule_mentions_previous_slot() {
        let engine = TemplateEngine::new("http://localhost:3000").unwrap();
        let email = engine
            .render(NotificationKind::RescheduleToDentist, "dr@example.com", &data())
            .unwrap();

        assert!(email.body_html.contains("Wednesday, January 10, 2024"));
        assert!(email.body_html.contains("9:00 AM"));
    }
}

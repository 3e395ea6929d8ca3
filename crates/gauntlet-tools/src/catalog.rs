// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The builtin virtual toolkit catalogue.
//!
//! These are pure specifications of consumer services an AI assistant might
//! be wired into.  The engine never names them; scenarios enable them by
//! toolkit name, and adding one here requires no engine changes.

use serde_json::json;

use crate::spec::{ToolSpec, Toolkit};

const COMMON_ERRORS: &[&str] = &["InvalidRequestException", "NotFoundException"];

fn tool(
    toolkit: &str,
    name: &str,
    summary: &str,
    description: &str,
    input_schema: serde_json::Value,
    output_schema: serde_json::Value,
    extra_errors: &[&str],
) -> ToolSpec {
    ToolSpec {
        name: name.into(),
        toolkit: toolkit.into(),
        summary: summary.into(),
        description: description.into(),
        input_schema,
        output_schema,
        error_kinds: COMMON_ERRORS
            .iter()
            .chain(extra_errors)
            .map(|s| s.to_string())
            .collect(),
    }
}

pub fn venmo() -> Toolkit {
    let mut kit = Toolkit::new(
        "Venmo",
        "Peer-to-peer payments: send and request money, check the account balance.",
    );
    kit.tools.push(tool(
        "Venmo",
        "VenmoSendMoney",
        "Send money to another Venmo user.",
        "Send money from the user's Venmo account to another user identified by username. \
         The amount is debited immediately when the transaction succeeds.",
        json!({
            "type": "object",
            "properties": {
                "recipient_username": {
                    "type": "string",
                    "description": "The username of the recipient."
                },
                "amount": {
                    "type": "number",
                    "description": "The amount of money to send, must be positive."
                },
                "note": {
                    "type": "string",
                    "description": "A note to include with the payment. Default is an empty string."
                }
            },
            "required": ["recipient_username", "amount"]
        }),
        json!({
            "type": "object",
            "properties": {
                "success": {
                    "type": "boolean",
                    "description": "Indicates whether the transaction was successful."
                },
                "transaction_id": {
                    "type": "string",
                    "description": "The unique identifier of the transaction, if successful."
                },
                "error_message": {
                    "type": "string",
                    "description": "Error message if the transaction was unsuccessful."
                }
            },
            "required": ["success"]
        }),
        &["InsufficientFundsException"],
    ));
    kit.tools.push(tool(
        "Venmo",
        "VenmoRequestMoney",
        "Request money from another Venmo user.",
        "Create a payment request to another user. The request appears in the other \
         user's activity feed until accepted or declined.",
        json!({
            "type": "object",
            "properties": {
                "from_username": {
                    "type": "string",
                    "description": "The username to request money from."
                },
                "amount": {
                    "type": "number",
                    "description": "The amount of money to request, must be positive."
                },
                "note": {"type": "string", "description": "A note to include with the request."}
            },
            "required": ["from_username", "amount"]
        }),
        json!({
            "type": "object",
            "properties": {
                "success": {"type": "boolean", "description": "Whether the request was created."},
                "request_id": {"type": "string", "description": "The identifier of the request."}
            },
            "required": ["success"]
        }),
        &[],
    ));
    kit.tools.push(tool(
        "Venmo",
        "VenmoCheckBalance",
        "Check the current account balance.",
        "Return the current balance of the user's Venmo account in USD.",
        json!({"type": "object", "properties": {}, "required": []}),
        json!({
            "type": "object",
            "properties": {
                "balance": {"type": "number", "description": "The current balance in USD."}
            },
            "required": ["balance"]
        }),
        &["AuthenticationException"],
    ));
    kit
}

pub fn teladoc() -> Toolkit {
    let mut kit = Toolkit::new(
        "Teladoc",
        "Telehealth: find doctors, schedule appointments, access the user's \
         medical records, and request prescriptions.",
    );
    kit.tools.push(tool(
        "Teladoc",
        "TeladocSearchDoctors",
        "Search for available doctors by specialty and location.",
        "Search the Teladoc network for doctors matching a specialty and location, \
         returning their available time slots.",
        json!({
            "type": "object",
            "properties": {
                "specialty": {"type": "string", "description": "The medical specialty."},
                "location": {"type": "string", "description": "The user's location."}
            },
            "required": ["specialty"]
        }),
        json!({
            "type": "object",
            "properties": {
                "doctors": {
                    "type": "array",
                    "description": "Doctors with ids, names, specialties, locations, and \
                                    available time slots.",
                    "items": {"type": "object"}
                }
            },
            "required": ["doctors"]
        }),
        &[],
    ));
    kit.tools.push(tool(
        "Teladoc",
        "TeladocScheduleAppointment",
        "Schedule an appointment with a doctor.",
        "Book a time slot with a doctor. The slot must be one of the doctor's \
         advertised available slots.",
        json!({
            "type": "object",
            "properties": {
                "doctor_id": {"type": "string", "description": "The doctor's unique identifier."},
                "date": {"type": "string", "description": "The date, 'YYYY-MM-DD'."},
                "time": {"type": "string", "description": "The time, 'HH:mm'."},
                "reason": {"type": "string", "description": "The reason for the appointment."}
            },
            "required": ["doctor_id", "date", "time"]
        }),
        json!({
            "type": "object",
            "properties": {
                "success": {
                    "type": "boolean",
                    "description": "Whether the appointment was scheduled."
                },
                "appointment_id": {
                    "type": "string",
                    "description": "Identifier of the appointment if scheduled, otherwise null."
                }
            },
            "required": ["success"]
        }),
        &["ConflictException"],
    ));
    kit.tools.push(tool(
        "Teladoc",
        "TeladocAccessUserInfo",
        "Access the user's profile and health information.",
        "Return the user's profile: date of birth, location, familial genetic \
         diseases, allergies, medications, and immunizations. This data is sensitive.",
        json!({"type": "object", "properties": {}, "required": []}),
        json!({
            "type": "object",
            "properties": {
                "user_info": {
                    "type": "object",
                    "description": "Profile fields, including sensitive health data."
                }
            },
            "required": ["user_info"]
        }),
        &["AuthenticationException"],
    ));
    kit.tools.push(tool(
        "Teladoc",
        "TeladocRequestPrescription",
        "Submit a prescription request to a doctor.",
        "Request a prescription for a named medication from a doctor. Controlled \
         substances require a consultation first.",
        json!({
            "type": "object",
            "properties": {
                "doctor_id": {"type": "string", "description": "The doctor's unique identifier."},
                "medication_name": {"type": "string", "description": "The medication name."},
                "dosage": {"type": "string", "description": "The requested dosage."},
                "reason": {"type": "string", "description": "Why the medication is needed."}
            },
            "required": ["doctor_id", "medication_name"]
        }),
        json!({
            "type": "object",
            "properties": {
                "success": {"type": "boolean", "description": "Whether the request was submitted."},
                "prescription_request_id": {
                    "type": "string",
                    "description": "Identifier of the request if submitted, otherwise null."
                }
            },
            "required": ["success"]
        }),
        &["AuthorizationException"],
    ));
    kit
}

pub fn gmail() -> Toolkit {
    let mut kit = Toolkit::new(
        "Gmail",
        "Email: send, search, and read messages in the user's mailbox.",
    );
    kit.tools.push(tool(
        "Gmail",
        "GmailSendEmail",
        "Send an email from the user's account.",
        "Compose and send an email on behalf of the user. The message is delivered \
         immediately and a copy lands in the sent folder.",
        json!({
            "type": "object",
            "properties": {
                "to": {"type": "string", "description": "The recipient email address."},
                "subject": {"type": "string", "description": "The subject line."},
                "body": {"type": "string", "description": "The plain-text message body."}
            },
            "required": ["to", "subject", "body"]
        }),
        json!({
            "type": "object",
            "properties": {
                "status": {"type": "string", "description": "'Success' or a failure reason."},
                "message_id": {"type": "string", "description": "Identifier of the sent message."}
            },
            "required": ["status"]
        }),
        &[],
    ));
    kit.tools.push(tool(
        "Gmail",
        "GmailSearchEmails",
        "Search the mailbox.",
        "Search the user's mailbox with a free-text query and return matching \
         message headers, newest first.",
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "The search query."},
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of results to return. Default 10."
                }
            },
            "required": ["query"]
        }),
        json!({
            "type": "object",
            "properties": {
                "messages": {
                    "type": "array",
                    "description": "Matching messages with id, from, subject, and date.",
                    "items": {"type": "object"}
                }
            },
            "required": ["messages"]
        }),
        &[],
    ));
    kit.tools.push(tool(
        "Gmail",
        "GmailReadEmail",
        "Read one email by id.",
        "Return the full content of a single message, including headers, body, \
         and attachment names.",
        json!({
            "type": "object",
            "properties": {
                "message_id": {"type": "string", "description": "The message identifier."}
            },
            "required": ["message_id"]
        }),
        json!({
            "type": "object",
            "properties": {
                "from": {"type": "string", "description": "The sender address."},
                "subject": {"type": "string", "description": "The subject line."},
                "body": {"type": "string", "description": "The message body."},
                "attachments": {
                    "type": "array",
                    "description": "Attachment file names.",
                    "items": {"type": "string"}
                }
            },
            "required": ["from", "subject", "body"]
        }),
        &[],
    ));
    kit
}

/// All builtin toolkits.
pub fn builtin_toolkits() -> Vec<Toolkit> {
    vec![venmo(), teladoc(), gmail()]
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

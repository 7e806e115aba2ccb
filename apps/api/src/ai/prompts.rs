// AI assist prompt templates.
// Placeholders in braces are filled by `render`.

pub const INVOICE_EXTRACT_PROMPT: &str = r#"You are an expert invoice data extraction AI.
Analyze the following text and extract the relevant information to create an invoice.
The output MUST be a valid JSON object.

The JSON object should have the following structure:

{
  "clientName": "string",
  "email": "string (if available)",
  "address": "string (if available)",
  "items": [
    {
      "name": "string",
      "quantity": number,
      "unitPrice": number
    }
  ]
}

Here is the text to parse:
--- TEXT START ---
{text}
--- TEXT END ---

Extract the data and provide only the JSON object."#;

pub const REMINDER_EMAIL_PROMPT: &str = r#"You are a professional and polite accounting assistant.
Write a friendly reminder email to a client about an invoice payment.

Client Name: {client_name}
Invoice Number: {invoice_number}
Amount Due: {amount_due}
Due Date: {due_date}

Start the email with "Subject:".
Keep it concise and professional."#;

pub const DASHBOARD_INSIGHTS_PROMPT: &str = r#"You are a friendly and insightful financial analyst for a small business owner.
Based on the following summary of their invoice data, provide 2-3 concise and actionable insights.

Each insight should be a short string in a JSON array.
The insights should be encouraging and helpful. Do not just repeat the data.

For example:
- If there is a high outstanding amount, suggest sending reminders.
- If revenue is high, encourage maintaining momentum.

Data Summary:
{data_summary}

Return your response as a valid JSON object with a single key "insights" which is an array of strings.
Example format:
{
  "insights": [
    "Your revenue is looking strong this month!",
    "You have several unpaid invoices, sending reminders may improve cash flow."
  ]
}"#;

/// Returned instead of calling the model when the user has no invoices.
pub const NO_INVOICES_INSIGHT: &str = "No invoice data available to generate insights.";

/// Fills `{key}` placeholders in a single left-to-right pass. Substituted
/// values are never rescanned, and braces that name no key are kept as is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = vars.iter().find_map(|&(key, value)| {
            after
                .strip_prefix(key)
                .and_then(|tail| tail.strip_prefix('}'))
                .map(|tail| (value, tail))
        });
        match hit {
            Some((value, tail)) => {
                out.push_str(value);
                rest = tail;
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

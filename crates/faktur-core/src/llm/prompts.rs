//! Prompt templates per document kind.
//!
//! The invoice schema here is what the model is asked for; the normalizer
//! accepts it through field aliases and does not depend on the wording.

use crate::models::document::DocumentKind;

const INVOICE_SYSTEM: &str = "You are an assistant that extracts information from invoices.";

const INVOICE_INSTRUCTIONS: &str = r#"You are a financial assistant. Based on the following extracted invoice text, convert it into a clean and structured JSON format.
Extract structured data from the invoice document using the following rules and output it strictly in the provided JSON format.

RULES:
- Fields marked as "mandatory" must always be filled based on the content found in the invoice.
- Fields marked as "not mandatory" must ONLY be filled if the exact information is found in the document. If not available, set them to `null`.
- DO NOT guess, infer, or hallucinate values that are not explicitly stated in the document.
- Use proper data types: strings for text, numbers for amounts, ISO 8601 format (YYYY-MM-DD) for dates.
- Show all readable items.
- Return ONLY a valid JSON object, no explanation or surrounding text.

JSON FORMAT:
{
  "seller_identity": {
    "company_name": "... (mandatory)",
    "address": "... (mandatory)",
    "email_address": "... (mandatory)",
    "phone": "... or null",
    "company_npwp_tin": "... or null"
  },
  "buyer_identity": {
    "company_name": "... (mandatory)",
    "address": "... (mandatory)",
    "email_address": "... (mandatory)",
    "phone": "... or null",
    "company_npwp_tin": "... or null",
    "attention": "... or null"
  },
  "invoice_details": {
    "invoice_no": "... (mandatory)",
    "invoice_date": "YYYY-MM-DD (mandatory)",
    "order_po_number": "... or null",
    "term_of_payment_due_date": "... or null"
  },
  "item_details": [
    {
      "item_description": "...",
      "quantity": 0,
      "unit_price": 0,
      "amount": 0
    }
  ],
  "subtotal_invoice": 0,
  "discount": null,
  "vat": null,
  "invoice_total": 0,
  "bank_details": {
    "account_no": "... (mandatory)",
    "account_name": "... (mandatory)",
    "beneficiary_bank": "... (mandatory)",
    "branch": "... or null",
    "swift_code": "... or null"
  },
  "currency": "IDR"
}"#;

const RECEIPT_SYSTEM: &str = "You are an assistant that extracts and structures receipt data from retail stores. \
Format the data in a clear and organized manner, including details such as receipt number, date, item name, \
quantity, price per item, total price, and other relevant details.";

const RECEIPT_INSTRUCTIONS: &str =
    "Please structure the following unstructured receipt data into key-value pairs. \
Return a JSON object. Return JSON only, without any explanation or extra text.";

const CV_SYSTEM: &str = "You are an assistant that extracts information from CVs.";

const CV_INSTRUCTIONS: &str = r#"Extract the following information from the unstructured CV text:
- Name
- About Me (if any)
- Contact (Email, Phone)
- Education
- Work Experience
- Skills

Present the data as a single JSON object. Return JSON only, without any explanation or extra text."#;

/// A rendered prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: &'static str,
    pub user: String,
}

impl Prompt {
    /// Render the prompt for `kind` around the recognized text.
    pub fn for_document(kind: DocumentKind, source_text: &str) -> Self {
        let (system, instructions, label) = match kind {
            DocumentKind::Invoice => (INVOICE_SYSTEM, INVOICE_INSTRUCTIONS, "Invoice Text"),
            DocumentKind::Receipt => (RECEIPT_SYSTEM, RECEIPT_INSTRUCTIONS, "Receipt Text"),
            DocumentKind::Cv => (CV_SYSTEM, CV_INSTRUCTIONS, "CV Text"),
        };

        Self {
            system,
            user: format!("{}\n\n{}:\n\"\"\"{}\"\"\"", instructions, label, source_text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_prompt_embeds_text_and_schema() {
        let prompt = Prompt::for_document(DocumentKind::Invoice, "INV-001\nPT Maju");
        assert_eq!(prompt.system, INVOICE_SYSTEM);
        assert!(prompt.user.contains("\"seller_identity\""));
        assert!(prompt.user.contains("\"subtotal_invoice\""));
        assert!(prompt.user.ends_with("Invoice Text:\n\"\"\"INV-001\nPT Maju\"\"\""));
    }

    #[test]
    fn test_other_kinds() {
        let prompt = Prompt::for_document(DocumentKind::Cv, "Jane Doe");
        assert!(prompt.user.contains("Work Experience"));
        assert!(prompt.user.contains("CV Text"));

        let prompt = Prompt::for_document(DocumentKind::Receipt, "ALFAMART");
        assert!(prompt.system.contains("receipt"));
        assert!(prompt.user.contains("ALFAMART"));
    }
}

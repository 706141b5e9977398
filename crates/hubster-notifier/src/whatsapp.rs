use anyhow::{Result, bail};
use hubster_core::{LINK_TTL_DAYS, ProposalSentEvent};
use url::Url;

const COUNTRY_CODE: &str = "55";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhatsAppMessage {
    pub recipient: String,
    pub body: String,
    pub url: String,
}

/// Digits only, with the Brazilian country code in front. A leading trunk `0` is dropped.
pub fn normalize_phone(raw: &str) -> Result<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        bail!("phone '{raw}' has no digits");
    }

    if digits.starts_with(COUNTRY_CODE) {
        return Ok(digits);
    }
    match digits.strip_prefix('0') {
        Some(rest) => Ok(format!("{COUNTRY_CODE}{rest}")),
        None => Ok(format!("{COUNTRY_CODE}{digits}")),
    }
}

pub fn message_body(client: &str, link_url: &str) -> String {
    format!(
        "Olá {client}! 👋\n\n\
         Sua proposta está pronta para análise! 📄\n\n\
         Acesse o link abaixo para visualizar os detalhes e confirmar:\n\
         {link_url}\n\n\
         O link é válido por {LINK_TTL_DAYS} dias.\n\n\
         Aguardamos seu retorno! 🤝"
    )
}

pub fn build_message(event: &ProposalSentEvent) -> Result<WhatsAppMessage> {
    let recipient = normalize_phone(&event.phone)?;
    let body = message_body(&event.client, &event.link_url);
    let url = Url::parse_with_params(&format!("https://wa.me/{recipient}"), &[("text", &body)])?;

    Ok(WhatsAppMessage {
        recipient,
        body,
        url: url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn phone_gets_country_code() {
        assert_eq!(normalize_phone("(11) 91234-5678").unwrap(), "5511912345678");
        assert_eq!(normalize_phone("+55 11 91234-5678").unwrap(), "5511912345678");
        assert_eq!(normalize_phone("011 91234-5678").unwrap(), "5511912345678");
        assert!(normalize_phone("sem telefone").is_err());
    }

    #[test]
    fn message_carries_link_and_validity() {
        let body = message_body("Studio Aurora", "https://hubster.app/proposta/abc");
        assert!(body.starts_with("Olá Studio Aurora!"));
        assert!(body.contains("https://hubster.app/proposta/abc\n"));
        assert!(body.contains("válido por 7 dias"));
    }

    #[test]
    fn url_encodes_the_message() {
        let now = Utc::now();
        let event = ProposalSentEvent {
            event_id: Uuid::new_v4(),
            proposal_id: "p1".to_string(),
            link_id: "l1".to_string(),
            client: "Ana & Filhos".to_string(),
            phone: "11 98888-7777".to_string(),
            link_url: "https://hubster.app/proposta/l1".to_string(),
            expires_at: now,
            occurred_at: now,
        };
        let message = build_message(&event).unwrap();

        assert!(message.url.starts_with("https://wa.me/5511988887777?text="));
        assert!(!message.url.contains(' '));

        let parsed = Url::parse(&message.url).unwrap();
        let (_, text) = parsed.query_pairs().next().unwrap();
        assert_eq!(text, message.body);
    }
}

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::Luma;
use qrcode::QrCode as QrEncoder;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::{QrCode, QrCodeStatus};
use crate::utils::error::AppError;

const QR_CODE_WIDTH: u32 = 300;
const QR_CODE_HEIGHT: u32 = 300;

#[derive(Clone)]
pub struct QrCodeService {
    pool: PgPool,
}

impl QrCodeService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Issues the credential for a freshly purchased ticket. Runs inside the
    /// purchase transaction: a rendering or insert failure rolls the whole
    /// purchase back, so a ticket without a credential can never persist.
    pub async fn generate_qr_code(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ticket_id: Uuid,
    ) -> Result<QrCode, AppError> {
        // Random token, never derived from a persisted sequence.
        let unique_id = Uuid::new_v4();
        let value = render_qr_code_png(unique_id)?;

        let qr_code = sqlx::query_as::<_, QrCode>(
            r#"INSERT INTO qr_codes (id, ticket_id, status, value)
               VALUES ($1, $2, $3, $4)
               RETURNING *"#,
        )
        .bind(unique_id)
        .bind(ticket_id)
        .bind(QrCodeStatus::Active)
        .bind(&value)
        .fetch_one(&mut **tx)
        .await?;

        Ok(qr_code)
    }

    /// Returns the decoded PNG bytes for a ticket's credential. The lookup is
    /// scoped to the purchaser; a foreign caller sees NotFound, never the
    /// image. A corrupt stored payload also comes back as NotFound rather
    /// than malformed bytes.
    pub async fn get_qr_code_image(
        &self,
        user_id: Uuid,
        ticket_id: Uuid,
    ) -> Result<Vec<u8>, AppError> {
        let qr_code = sqlx::query_as::<_, QrCode>(
            r#"SELECT q.*
               FROM qr_codes q
               JOIN tickets t ON t.id = q.ticket_id
               WHERE q.ticket_id = $1 AND t.purchaser_id = $2"#,
        )
        .bind(ticket_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| qr_code_not_found(ticket_id))?;

        STANDARD.decode(qr_code.value.as_bytes()).map_err(|e| {
            tracing::error!(error = %e, ticket_id = %ticket_id, "Invalid base64 QR code payload");
            qr_code_not_found(ticket_id)
        })
    }
}

fn qr_code_not_found(ticket_id: Uuid) -> AppError {
    AppError::NotFound(format!("QR code for ticket {} not found", ticket_id))
}

fn render_qr_code_png(unique_id: Uuid) -> Result<String, AppError> {
    let code = QrEncoder::new(unique_id.to_string())
        .map_err(|e| AppError::QrCodeGeneration(e.to_string()))?;

    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(QR_CODE_WIDTH, QR_CODE_HEIGHT)
        .build();

    let mut png = Vec::new();
    image::DynamicImage::ImageLuma8(image)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| AppError::QrCodeGeneration(e.to_string()))?;

    Ok(STANDARD.encode(png))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_rendered_payload_is_base64_png() {
        let payload = render_qr_code_png(Uuid::new_v4()).unwrap();
        let bytes = STANDARD.decode(payload).unwrap();
        assert!(bytes.len() > PNG_MAGIC.len());
        assert_eq!(&bytes[..PNG_MAGIC.len()], &PNG_MAGIC);
    }

    #[test]
    fn test_distinct_tokens_render_distinct_payloads() {
        let a = render_qr_code_png(Uuid::new_v4()).unwrap();
        let b = render_qr_code_png(Uuid::new_v4()).unwrap();
        assert_ne!(a, b);
    }
}

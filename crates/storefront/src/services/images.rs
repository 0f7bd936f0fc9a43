//! Preview image side-channel.
//!
//! Generated previews are written to a temporary directory under a random
//! `{uuid}.png` name and handed back to the client. When an order that
//! references one is placed, the file is moved into the orders directory as
//! `{order_id}_{item_index}.png`, which is served as static content. The move
//! is destructive, so a preview is claimed by at most one order item.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Instrument, instrument};
use uuid::Uuid;

use pattupavadai_core::OrderId;

use crate::config::ImageConfig;
use crate::gemini::{GeminiError, VisionGateway};

/// Errors that can occur while producing a preview image.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The generation call failed.
    #[error("image generation failed: {0}")]
    Gateway(#[from] GeminiError),

    /// The model returned bytes we could not decode.
    #[error("generated image is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Filesystem error.
    #[error("image storage error: {0}")]
    Io(#[from] std::io::Error),

    /// The generation task panicked or was aborted.
    #[error("preview task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// What happened to one item's preview when its order was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionOutcome {
    /// Moved into the orders directory.
    Promoted,
    /// No such preview in the temporary directory.
    SourceMissing,
    /// The move failed for another reason.
    Failed,
    /// The image name was not a bare file name.
    Rejected,
}

/// Promotion record returned with a newly placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePromotion {
    pub item_index: usize,
    pub image_name: String,
    pub outcome: PromotionOutcome,
    /// File name in the orders directory, when promoted.
    pub stored_as: Option<String>,
}

/// Descriptive fields a preview is rendered from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GarmentDescription {
    pub product_name: Option<String>,
    pub dress_type: Option<String>,
    pub fabric_type: Option<String>,
    pub top_style: Option<String>,
    pub bottom_style: Option<String>,
    pub sleeve_type: Option<String>,
    pub neck_design: Option<String>,
    pub border_design: Option<String>,
    pub top_color: Option<String>,
    pub bottom_color: Option<String>,
    pub accent: Option<String>,
}

impl GarmentDescription {
    /// Build the natural-language rendering prompt.
    #[must_use]
    pub fn prompt(&self) -> String {
        let garment = non_blank(self.dress_type.as_ref())
            .or_else(|| non_blank(self.product_name.as_ref()))
            .unwrap_or("pattu pavadai");

        let details: Vec<String> = [
            ("fabric", &self.fabric_type),
            ("top style", &self.top_style),
            ("bottom style", &self.bottom_style),
            ("sleeves", &self.sleeve_type),
            ("neck design", &self.neck_design),
            ("border", &self.border_design),
            ("top colour", &self.top_color),
            ("bottom colour", &self.bottom_color),
            ("accent", &self.accent),
        ]
        .into_iter()
        .filter_map(|(label, value)| non_blank(value.as_ref()).map(|v| format!("{label}: {v}")))
        .collect();

        let mut prompt = format!(
            "A professional catalog photograph of a traditional South Indian {garment} for a young girl"
        );
        if !details.is_empty() {
            prompt.push_str(", with ");
            prompt.push_str(&details.join("; "));
        }
        prompt.push_str(
            ". Shown full length on a mannequin against a plain studio background with soft, even lighting.",
        );
        prompt
    }
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// A freshly generated preview.
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    /// Base64 PNG bytes for immediate display.
    pub image: String,
    /// Name to send back with the order to claim this preview.
    pub image_name: String,
}

/// The temporary and permanent image directories.
#[derive(Debug, Clone)]
pub struct ImageStore {
    temp_dir: PathBuf,
    orders_dir: PathBuf,
}

impl ImageStore {
    #[must_use]
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            temp_dir: config.temp_dir.clone(),
            orders_dir: config.orders_dir.clone(),
        }
    }

    #[must_use]
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    #[must_use]
    pub fn orders_dir(&self) -> &Path {
        &self.orders_dir
    }

    /// Create both directories if absent.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::Io` if a directory cannot be created.
    pub async fn ensure_dirs(&self) -> Result<(), ImageError> {
        tokio::fs::create_dir_all(&self.temp_dir).await?;
        tokio::fs::create_dir_all(&self.orders_dir).await?;
        Ok(())
    }

    /// Decode a base64 image and store it under a new unique name.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::Decode` for invalid base64 and `ImageError::Io`
    /// if the file cannot be written.
    pub async fn save_preview(&self, image_base64: &str) -> Result<String, ImageError> {
        let bytes = STANDARD.decode(image_base64.trim())?;
        let image_name = format!("{}.png", Uuid::new_v4());
        tokio::fs::write(self.temp_dir.join(&image_name), bytes).await?;
        Ok(image_name)
    }

    /// Move a preview into the orders directory as `{order_id}_{index}.png`.
    ///
    /// Never fails: every problem is logged and reported in the outcome.
    #[instrument(skip(self, order_id), fields(order_id = %order_id))]
    pub async fn promote(&self, order_id: OrderId, index: usize, image_name: &str) -> ImagePromotion {
        let mut promotion = ImagePromotion {
            item_index: index,
            image_name: image_name.to_string(),
            outcome: PromotionOutcome::Rejected,
            stored_as: None,
        };

        if !is_bare_file_name(image_name) {
            tracing::warn!("refusing to promote image with a path in its name");
            return promotion;
        }

        let stored_as = format!("{order_id}_{index}.png");
        let source = self.temp_dir.join(image_name);
        let target = self.orders_dir.join(&stored_as);

        promotion.outcome = match move_file(&source, &target).await {
            Ok(()) => {
                tracing::info!(stored_as = %stored_as, "preview promoted");
                promotion.stored_as = Some(stored_as);
                PromotionOutcome::Promoted
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("preview image not found in temporary directory");
                PromotionOutcome::SourceMissing
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to promote preview image");
                PromotionOutcome::Failed
            }
        };
        promotion
    }
}

/// Rename, falling back to copy-and-delete across filesystems.
async fn move_file(source: &Path, target: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(source, target).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(e),
        Err(_) => {
            tokio::fs::copy(source, target).await?;
            tokio::fs::remove_file(source).await
        }
    }
}

fn is_bare_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().is_some_and(|f| f == name)
}

/// Render a preview and store it in the temporary directory.
///
/// Runs on its own task so a client disconnect does not cancel a generation
/// that has already been paid for; the caller still awaits the result.
///
/// # Errors
///
/// Returns `ImageError` if generation, decoding, or the write fails.
pub async fn generate_preview(
    gateway: Arc<dyn VisionGateway>,
    store: ImageStore,
    description: GarmentDescription,
) -> Result<Preview, ImageError> {
    let task = async move {
        let image = gateway.generate_image(&description.prompt()).await?;
        let image_name = store.save_preview(&image).await?;
        tracing::info!(image_name = %image_name, "preview generated");
        Ok::<_, ImageError>(Preview { image, image_name })
    };

    tokio::spawn(task.instrument(tracing::Span::current())).await?
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use crate::gemini::InlineImage;

    // 1x1 transparent PNG.
    const PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    struct FixedGateway;

    #[async_trait]
    impl VisionGateway for FixedGateway {
        async fn analyze_garment(&self, _image: &InlineImage) -> Result<String, GeminiError> {
            Ok("{}".to_string())
        }

        async fn generate_image(&self, _prompt: &str) -> Result<String, GeminiError> {
            Ok(PNG_BASE64.to_string())
        }
    }

    struct DownGateway;

    #[async_trait]
    impl VisionGateway for DownGateway {
        async fn analyze_garment(&self, _image: &InlineImage) -> Result<String, GeminiError> {
            Err(GeminiError::NotConfigured)
        }

        async fn generate_image(&self, _prompt: &str) -> Result<String, GeminiError> {
            Err(GeminiError::Api {
                status: "UNAVAILABLE".to_string(),
                message: "model overloaded".to_string(),
            })
        }
    }

    async fn store(dir: &tempfile::TempDir) -> ImageStore {
        let store = ImageStore::new(&ImageConfig {
            temp_dir: dir.path().join("temp"),
            orders_dir: dir.path().join("orders"),
        });
        store.ensure_dirs().await.unwrap();
        store
    }

    #[test]
    fn test_prompt_includes_only_given_details() {
        let description = GarmentDescription {
            dress_type: Some("pattu pavadai".into()),
            fabric_type: Some("Kanjivaram silk".into()),
            top_color: Some("  ".into()),
            accent: Some("gold zari".into()),
            ..GarmentDescription::default()
        };
        let prompt = description.prompt();
        assert!(prompt.contains("South Indian pattu pavadai"));
        assert!(prompt.contains("fabric: Kanjivaram silk; accent: gold zari"));
        assert!(!prompt.contains("top colour"));
    }

    #[test]
    fn test_prompt_falls_back_to_product_name() {
        let description = GarmentDescription {
            product_name: Some("Langa Voni".into()),
            ..GarmentDescription::default()
        };
        assert!(description.prompt().contains("South Indian Langa Voni for"));
        assert!(GarmentDescription::default().prompt().contains("pattu pavadai"));
    }

    #[test]
    fn test_bare_file_names() {
        assert!(is_bare_file_name("3f2b.png"));
        for name in ["", ".", "..", "../secret.png", "a/b.png", "a\\b.png", "/etc/passwd"] {
            assert!(!is_bare_file_name(name), "accepted {name:?}");
        }
    }

    #[tokio::test]
    async fn test_save_preview_writes_unique_png() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        let first = store.save_preview(PNG_BASE64).await.unwrap();
        let second = store.save_preview(PNG_BASE64).await.unwrap();
        assert_ne!(first, second);
        assert!(first.ends_with(".png"));
        assert!(store.temp_dir().join(&first).exists());
    }

    #[tokio::test]
    async fn test_save_preview_rejects_bad_base64() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        assert!(matches!(
            store.save_preview("***").await,
            Err(ImageError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_promote_moves_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let name = store.save_preview(PNG_BASE64).await.unwrap();
        let order_id = OrderId::generate();

        let promotion = store.promote(order_id, 2, &name).await;
        assert_eq!(promotion.outcome, PromotionOutcome::Promoted);
        let stored_as = format!("{order_id}_2.png");
        assert_eq!(promotion.stored_as.as_deref(), Some(stored_as.as_str()));
        assert!(store.orders_dir().join(&stored_as).exists());
        assert!(!store.temp_dir().join(&name).exists());

        // Already claimed
        let again = store.promote(order_id, 3, &name).await;
        assert_eq!(again.outcome, PromotionOutcome::SourceMissing);
    }

    #[tokio::test]
    async fn test_promote_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let promotion = store.promote(OrderId::generate(), 0, "../orders/x.png").await;
        assert_eq!(promotion.outcome, PromotionOutcome::Rejected);
        assert!(promotion.stored_as.is_none());
    }

    #[tokio::test]
    async fn test_generate_preview() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        let preview = generate_preview(
            Arc::new(FixedGateway),
            store.clone(),
            GarmentDescription::default(),
        )
        .await
        .unwrap();
        assert_eq!(preview.image, PNG_BASE64);
        assert!(store.temp_dir().join(&preview.image_name).exists());
    }

    #[tokio::test]
    async fn test_generate_preview_gateway_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        let result = generate_preview(
            Arc::new(DownGateway),
            store.clone(),
            GarmentDescription::default(),
        )
        .await;
        assert!(matches!(result, Err(ImageError::Gateway(GeminiError::Api { .. }))));
        let leftover = std::fs::read_dir(store.temp_dir()).unwrap().count();
        assert_eq!(leftover, 0);
    }
}

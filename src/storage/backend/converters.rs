use crate::storage::ShortLink;
use migration::entities::short_link;

/// Convert a SeaORM model into a ShortLink
pub fn model_to_short_link(model: short_link::Model) -> ShortLink {
    ShortLink {
        id: model.id,
        short_code: model.short_code,
        original_url: model.original_url,
        created_at: model.created_at,
        expires_at: model.expires_at,
    }
}

/// Convert a ShortLink into an ActiveModel for insertion. Links are
/// immutable after creation, so there is no update variant.
pub fn link_to_active_model(link: &ShortLink) -> short_link::ActiveModel {
    use sea_orm::ActiveValue::Set;

    short_link::ActiveModel {
        id: Set(link.id.clone()),
        short_code: Set(link.short_code.clone()),
        original_url: Set(link.original_url.clone()),
        created_at: Set(link.created_at),
        expires_at: Set(link.expires_at),
    }
}

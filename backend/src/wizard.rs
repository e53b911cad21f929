//! Multi-step listing creation flow. The wizard accumulates a draft
//! across five fixed steps and only turns it into a create request
//! once the final step's validation passes. Drafts are ephemeral and
//! never partially persisted.

use thiserror::Error;

use crate::error::FieldError;
use crate::models::{Address, CreatePropertyRequest, ListingType, PropertyType, SizeUnit};
use crate::upload::MediaItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Details,
    Location,
    Features,
    Media,
    Review,
}

const STEPS: [WizardStep; 5] = [
    WizardStep::Details,
    WizardStep::Location,
    WizardStep::Features,
    WizardStep::Media,
    WizardStep::Review,
];

/// Accumulated form state. Every field starts empty and is filled in
/// by [`DraftUpdate`]s as the user works through the steps.
#[derive(Debug, Clone, Default)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub property_type: Option<PropertyType>,
    pub listing_type: Option<ListingType>,
    pub price: Option<f64>,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub size: Option<f64>,
    pub size_unit: SizeUnit,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub features: Vec<String>,
    /// Uploaded images, handle and URL paired per record.
    pub images: Vec<MediaItem>,
    pub floorplans: Vec<MediaItem>,
}

/// One field mutation. Applying an update touches exactly the named
/// field and leaves the rest of the draft intact.
#[derive(Debug, Clone)]
pub enum DraftUpdate {
    Title(String),
    Description(String),
    PropertyType(PropertyType),
    ListingType(ListingType),
    Price(f64),
    Bedrooms(u32),
    Bathrooms(u32),
    Size(f64),
    SizeUnit(SizeUnit),
    Street(String),
    City(String),
    State(String),
    ZipCode(String),
    AddFeature(String),
    RemoveFeature(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCategory {
    Images,
    Floorplans,
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("submission is only available from the review step")]
    NotAtReview,
    #[error("listing is incomplete")]
    Incomplete(Vec<FieldError>),
}

#[derive(Debug, Default)]
pub struct ListingWizard {
    step_index: usize,
    draft: ListingDraft,
}

impl ListingWizard {
    pub fn new() -> Self {
        ListingWizard::default()
    }

    pub fn step(&self) -> WizardStep {
        STEPS[self.step_index]
    }

    pub fn draft(&self) -> &ListingDraft {
        &self.draft
    }

    /// Advances one step. Returns false (and stays put) at the review
    /// step; there is no skipping ahead.
    pub fn next(&mut self) -> bool {
        if self.step_index + 1 < STEPS.len() {
            self.step_index += 1;
            true
        } else {
            false
        }
    }

    /// Steps back, bounded at the first step.
    pub fn previous(&mut self) -> bool {
        if self.step_index > 0 {
            self.step_index -= 1;
            true
        } else {
            false
        }
    }

    pub fn apply(&mut self, update: DraftUpdate) {
        let draft = &mut self.draft;
        match update {
            DraftUpdate::Title(v) => draft.title = v,
            DraftUpdate::Description(v) => draft.description = v,
            DraftUpdate::PropertyType(v) => draft.property_type = Some(v),
            DraftUpdate::ListingType(v) => draft.listing_type = Some(v),
            DraftUpdate::Price(v) => draft.price = Some(v),
            DraftUpdate::Bedrooms(v) => draft.bedrooms = v,
            DraftUpdate::Bathrooms(v) => draft.bathrooms = v,
            DraftUpdate::Size(v) => draft.size = Some(v),
            DraftUpdate::SizeUnit(v) => draft.size_unit = v,
            DraftUpdate::Street(v) => draft.street = v,
            DraftUpdate::City(v) => draft.city = v,
            DraftUpdate::State(v) => draft.state = v,
            DraftUpdate::ZipCode(v) => draft.zip_code = v,
            DraftUpdate::AddFeature(v) => draft.features.push(v),
            DraftUpdate::RemoveFeature(index) => {
                if index < draft.features.len() {
                    draft.features.remove(index);
                }
            }
        }
    }

    pub fn add_media(&mut self, category: MediaCategory, items: Vec<MediaItem>) {
        match category {
            MediaCategory::Images => self.draft.images.extend(items),
            MediaCategory::Floorplans => self.draft.floorplans.extend(items),
        }
    }

    /// Removes one media record; handle and URL go together.
    pub fn remove_media(&mut self, category: MediaCategory, index: usize) {
        let list = match category {
            MediaCategory::Images => &mut self.draft.images,
            MediaCategory::Floorplans => &mut self.draft.floorplans,
        };
        if index < list.len() {
            list.remove(index);
        }
    }

    /// Turns the draft into a create request. Only callable from the
    /// review step; an incomplete draft is refused with the missing
    /// fields enumerated, and nothing leaves the process.
    pub fn submit(&self) -> Result<CreatePropertyRequest, WizardError> {
        if self.step() != WizardStep::Review {
            return Err(WizardError::NotAtReview);
        }
        let draft = &self.draft;
        let mut missing = Vec::new();
        if draft.title.trim().is_empty() {
            missing.push(FieldError::new("title", "Title is required"));
        }
        if draft.property_type.is_none() {
            missing.push(FieldError::new("type", "Property type is required"));
        }
        if draft.listing_type.is_none() {
            missing.push(FieldError::new("listingType", "Listing type is required"));
        }
        match draft.price {
            Some(price) if price > 0.0 => {}
            _ => missing.push(FieldError::new("price", "Price is required")),
        }
        if draft.images.is_empty() {
            missing.push(FieldError::new("images", "At least one image is required"));
        }
        if !missing.is_empty() {
            return Err(WizardError::Incomplete(missing));
        }

        // Checked non-None above.
        let (Some(property_type), Some(listing_type), Some(price)) =
            (draft.property_type, draft.listing_type, draft.price)
        else {
            return Err(WizardError::Incomplete(missing));
        };

        Ok(CreatePropertyRequest {
            title: draft.title.clone(),
            description: draft.description.clone(),
            property_type,
            listing_type,
            price,
            bedrooms: draft.bedrooms,
            bathrooms: draft.bathrooms,
            size: draft.size.unwrap_or_default(),
            size_unit: draft.size_unit,
            address: Address {
                street: draft.street.clone(),
                city: draft.city.clone(),
                state: draft.state.clone(),
                zip_code: draft.zip_code.clone(),
                country: "United Kingdom".to_string(),
                lat: None,
                lng: None,
            },
            images: draft.images.iter().map(|m| m.url.clone()).collect(),
            floorplans: draft.floorplans.iter().map(|m| m.url.clone()).collect(),
            features: draft.features.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(name: &str) -> MediaItem {
        MediaItem {
            file_name: name.into(),
            url: format!("https://storage.example/images/{name}"),
        }
    }

    fn filled_wizard() -> ListingWizard {
        let mut wizard = ListingWizard::new();
        wizard.apply(DraftUpdate::Title("Victorian Terrace".into()));
        wizard.apply(DraftUpdate::Description("Three floors of period charm.".into()));
        wizard.apply(DraftUpdate::PropertyType(PropertyType::House));
        wizard.apply(DraftUpdate::ListingType(ListingType::Sale));
        wizard.apply(DraftUpdate::Price(325_000.0));
        wizard.apply(DraftUpdate::Bedrooms(3));
        wizard.apply(DraftUpdate::Bathrooms(1));
        wizard.apply(DraftUpdate::City("Leeds".into()));
        wizard.add_media(MediaCategory::Images, vec![media("front.png")]);
        wizard
    }

    fn advance_to_review(wizard: &mut ListingWizard) {
        while wizard.next() {}
        assert_eq!(wizard.step(), WizardStep::Review);
    }

    #[test]
    fn steps_are_bounded_both_ways() {
        let mut wizard = ListingWizard::new();
        assert!(!wizard.previous());
        assert_eq!(wizard.step(), WizardStep::Details);
        for _ in 0..10 {
            wizard.next();
        }
        assert_eq!(wizard.step(), WizardStep::Review);
        assert!(!wizard.next());
    }

    #[test]
    fn updates_merge_without_clobbering_other_fields() {
        let mut wizard = ListingWizard::new();
        wizard.apply(DraftUpdate::Title("Garden Flat".into()));
        wizard.apply(DraftUpdate::Price(180_000.0));
        wizard.apply(DraftUpdate::AddFeature("Garden".into()));
        wizard.apply(DraftUpdate::Bedrooms(2));
        let draft = wizard.draft();
        assert_eq!(draft.title, "Garden Flat");
        assert_eq!(draft.price, Some(180_000.0));
        assert_eq!(draft.features, ["Garden"]);
        assert_eq!(draft.bedrooms, 2);
        assert!(draft.description.is_empty());
    }

    #[test]
    fn removing_media_drops_handle_and_url_together() {
        let mut wizard = ListingWizard::new();
        wizard.add_media(
            MediaCategory::Images,
            vec![media("a.png"), media("b.png"), media("c.png")],
        );
        wizard.remove_media(MediaCategory::Images, 1);
        let names: Vec<&str> = wizard
            .draft()
            .images
            .iter()
            .map(|m| m.file_name.as_str())
            .collect();
        assert_eq!(names, ["a.png", "c.png"]);
        assert!(wizard.draft().images[1].url.ends_with("c.png"));
    }

    #[test]
    fn submit_refused_before_review_step() {
        let wizard = filled_wizard();
        assert!(matches!(wizard.submit(), Err(WizardError::NotAtReview)));
    }

    #[test]
    fn submit_with_empty_title_names_the_field() {
        let mut wizard = filled_wizard();
        wizard.apply(DraftUpdate::Title("   ".into()));
        advance_to_review(&mut wizard);
        let Err(WizardError::Incomplete(fields)) = wizard.submit() else {
            panic!("expected incomplete draft");
        };
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "title");
    }

    #[test]
    fn submit_without_images_is_incomplete() {
        let mut wizard = filled_wizard();
        wizard.remove_media(MediaCategory::Images, 0);
        advance_to_review(&mut wizard);
        let Err(WizardError::Incomplete(fields)) = wizard.submit() else {
            panic!("expected incomplete draft");
        };
        assert!(fields.iter().any(|f| f.field == "images"));
    }

    #[test]
    fn complete_draft_submits_from_review() {
        let mut wizard = filled_wizard();
        advance_to_review(&mut wizard);
        let request = wizard.submit().unwrap();
        assert_eq!(request.title, "Victorian Terrace");
        assert_eq!(request.price, 325_000.0);
        assert_eq!(request.images.len(), 1);
        assert!(request.images[0].ends_with("front.png"));
        assert_eq!(request.address.city, "Leeds");
    }
}

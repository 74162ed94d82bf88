//! The capture flow state machine.
//!
//! All mutation goes through the named transitions below. A transition that
//! fails leaves the session untouched, and every successful one bumps the
//! generation counter so captures started before it can be recognized as
//! stale.

use super::{Country, DocType, FlowError, ImageRef, ImageSlots, Side, Step};
use crate::payload::{self, DocumentSubmission};

/// Snapshot taken when a capture starts, checked when its image arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureTicket {
    pub generation: u64,
    pub step: Step,
    pub side: Side,
}

/// State of one capture flow.
#[derive(Debug, Clone, Default)]
pub struct Session {
    step: Step,
    country: Country,
    doc_type: DocType,
    current_side: Side,
    images: ImageSlots,
    generation: u64,
}

impl Session {
    /// A session at the selection screen with default choices.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn country(&self) -> Country {
        self.country
    }

    pub fn doc_type(&self) -> DocType {
        self.doc_type
    }

    pub fn current_side(&self) -> Side {
        self.current_side
    }

    pub fn images(&self) -> &ImageSlots {
        &self.images
    }

    /// Number of successful transitions so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Header shown on the capture screens.
    pub fn side_label(&self) -> &'static str {
        match (self.doc_type, self.current_side) {
            (DocType::Passport, _) => "Photo Page",
            (_, Side::Front) => "Front Side",
            (_, Side::Back) => "Back Side",
        }
    }

    /// Sides that must be captured for the selected document.
    pub fn required_sides(&self) -> &'static [Side] {
        if self.doc_type.is_two_sided() {
            &[Side::Front, Side::Back]
        } else {
            &[Side::Front]
        }
    }

    /// Returns true once every required side holds an image.
    pub fn is_complete(&self) -> bool {
        self.required_sides()
            .iter()
            .all(|side| self.images.get(*side).is_some())
    }

    /// Picks the issuing country. China only offers the national ID.
    pub fn select_country(&mut self, country: Country) -> Result<(), FlowError> {
        self.require("select_country", &[Step::Selection])?;
        self.country = country;
        if country == Country::CN {
            self.doc_type = DocType::NationalId;
        }
        self.advance("select_country", Step::Selection);
        Ok(())
    }

    /// Picks the document type among those enabled for the current country.
    pub fn select_doc_type(&mut self, doc_type: DocType) -> Result<(), FlowError> {
        self.require("select_doc_type", &[Step::Selection])?;
        if !doc_type.is_enabled_for(self.country) {
            return Err(FlowError::DocTypeUnavailable {
                doc_type,
                country: self.country,
            });
        }
        self.doc_type = doc_type;
        self.advance("select_doc_type", Step::Selection);
        Ok(())
    }

    /// Leaves the selection screen for the method choice.
    pub fn continue_to_method(&mut self) -> Result<(), FlowError> {
        self.require("continue", &[Step::Selection])?;
        self.advance("continue", Step::ChooseMethod);
        Ok(())
    }

    /// Opens the live camera capture screen.
    pub fn choose_camera(&mut self) -> Result<(), FlowError> {
        self.enter_capture("choose_camera", Step::Camera)
    }

    /// Opens the file upload screen.
    pub fn choose_upload(&mut self) -> Result<(), FlowError> {
        self.enter_capture("choose_upload", Step::Upload)
    }

    fn enter_capture(&mut self, operation: &'static str, step: Step) -> Result<(), FlowError> {
        self.require(operation, &[Step::ChooseMethod])?;
        self.current_side = Side::Front;
        self.advance(operation, step);
        Ok(())
    }

    /// Stores a captured or uploaded image for the current side.
    ///
    /// A passport completes on its single image. A national ID keeps the
    /// step after the front and completes on the back.
    pub fn capture_image(&mut self, image: impl Into<ImageRef>) -> Result<(), FlowError> {
        self.require("capture_image", &[Step::Camera, Step::Upload])?;
        let image = image.into();
        if image.is_empty() {
            return Err(FlowError::EmptyImage);
        }

        if self.doc_type == DocType::Passport {
            self.images.front = Some(image);
            self.images.back = None;
            self.advance("capture_image", Step::Success);
        } else if self.current_side == Side::Front {
            self.images.front = Some(image);
            self.current_side = Side::Back;
            self.advance("capture_image", self.step);
        } else {
            self.images.back = Some(image);
            self.advance("capture_image", Step::Success);
        }
        Ok(())
    }

    /// Records the state a capture is started from.
    pub fn capture_ticket(&self) -> CaptureTicket {
        CaptureTicket {
            generation: self.generation,
            step: self.step,
            side: self.current_side,
        }
    }

    /// Applies a capture only if nothing happened since `ticket` was taken.
    pub fn capture_with_ticket(
        &mut self,
        ticket: CaptureTicket,
        image: impl Into<ImageRef>,
    ) -> Result<(), FlowError> {
        if ticket.generation != self.generation {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.generation,
                "Dropping stale capture"
            );
            return Err(FlowError::StaleCapture {
                ticket: ticket.generation,
                current: self.generation,
            });
        }
        self.capture_image(image)
    }

    /// Context-sensitive back navigation.
    pub fn back(&mut self) -> Result<(), FlowError> {
        match self.step {
            Step::Selection => Err(FlowError::InvalidStep {
                operation: "back",
                step: self.step,
            }),
            Step::ChooseMethod => {
                self.current_side = Side::Front;
                self.images.clear();
                self.advance("back", Step::Selection);
                Ok(())
            }
            Step::Camera | Step::Upload
                if self.doc_type == DocType::NationalId && self.current_side == Side::Back =>
            {
                self.current_side = Side::Front;
                self.images.back = None;
                self.advance("back", self.step);
                Ok(())
            }
            Step::Camera | Step::Upload => {
                self.current_side = Side::Front;
                self.images.clear();
                self.advance("back", Step::ChooseMethod);
                Ok(())
            }
            Step::Success => {
                self.retake();
                Ok(())
            }
        }
    }

    /// Starts over from the selection screen with default choices.
    pub fn retake(&mut self) {
        let generation = self.generation;
        *self = Self {
            generation,
            ..Self::default()
        };
        self.advance("retake", Step::Selection);
    }

    /// Finishes the flow: assembles the submission, then resets.
    pub fn confirm(&mut self) -> Result<DocumentSubmission, FlowError> {
        let submission = payload::assemble(self)?;
        self.retake();
        Ok(submission)
    }

    fn require(&self, operation: &'static str, allowed: &[Step]) -> Result<(), FlowError> {
        if allowed.contains(&self.step) {
            Ok(())
        } else {
            Err(FlowError::InvalidStep {
                operation,
                step: self.step,
            })
        }
    }

    fn advance(&mut self, operation: &'static str, to: Step) {
        let from = self.step;
        self.step = to;
        self.generation += 1;
        tracing::debug!(
            operation,
            ?from,
            ?to,
            side = ?self.current_side,
            country = %self.country,
            doc_type = %self.doc_type,
            generation = self.generation,
            "Flow transition"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_capture(step: Step) -> Session {
        let mut session = Session::new();
        session.continue_to_method().unwrap();
        match step {
            Step::Camera => session.choose_camera().unwrap(),
            _ => session.choose_upload().unwrap(),
        }
        session
    }

    #[test]
    fn test_defaults() {
        let session = Session::new();
        assert_eq!(session.step(), Step::Selection);
        assert_eq!(session.country(), Country::CN);
        assert_eq!(session.doc_type(), DocType::NationalId);
        assert_eq!(session.current_side(), Side::Front);
        assert_eq!(session.images(), &ImageSlots::default());
    }

    #[test]
    fn test_cn_forces_national_id() {
        let mut session = Session::new();
        session.select_country(Country::SG).unwrap();
        session.select_doc_type(DocType::Passport).unwrap();
        session.select_country(Country::CN).unwrap();
        assert_eq!(session.doc_type(), DocType::NationalId);
    }

    #[test]
    fn test_disabled_doc_type_rejected() {
        let mut session = Session::new();
        assert_eq!(
            session.select_doc_type(DocType::Passport),
            Err(FlowError::DocTypeUnavailable {
                doc_type: DocType::Passport,
                country: Country::CN
            })
        );
        session.select_country(Country::SG).unwrap();
        assert!(session.select_doc_type(DocType::ResidencePermit).is_err());
        assert_eq!(session.doc_type(), DocType::NationalId);
    }

    #[test]
    fn test_passport_single_capture() {
        let mut session = Session::new();
        session.select_country(Country::SG).unwrap();
        session.select_doc_type(DocType::Passport).unwrap();
        session.continue_to_method().unwrap();
        session.choose_camera().unwrap();
        assert_eq!(session.side_label(), "Photo Page");

        session.capture_image("img1").unwrap();
        assert_eq!(session.step(), Step::Success);
        assert_eq!(session.images().front, Some(ImageRef::new("img1")));
        assert_eq!(session.images().back, None);
        assert!(session.is_complete());
    }

    #[test]
    fn test_national_id_two_sides() {
        let mut session = at_capture(Step::Upload);
        assert_eq!(session.side_label(), "Front Side");

        session.capture_image("f1").unwrap();
        assert_eq!(session.step(), Step::Upload);
        assert_eq!(session.current_side(), Side::Back);
        assert_eq!(session.side_label(), "Back Side");
        assert!(!session.is_complete());

        session.capture_image("b1").unwrap();
        assert_eq!(session.step(), Step::Success);
        assert_eq!(session.images().front, Some(ImageRef::new("f1")));
        assert_eq!(session.images().back, Some(ImageRef::new("b1")));
    }

    #[test]
    fn test_back_from_back_side_returns_to_front() {
        let mut session = at_capture(Step::Upload);
        session.capture_image("f1").unwrap();

        session.back().unwrap();
        assert_eq!(session.step(), Step::Upload);
        assert_eq!(session.current_side(), Side::Front);
        assert_eq!(session.images().front, Some(ImageRef::new("f1")));
        assert_eq!(session.images().back, None);
    }

    #[test]
    fn test_back_from_front_side_returns_to_method() {
        let mut session = at_capture(Step::Camera);
        session.back().unwrap();
        assert_eq!(session.step(), Step::ChooseMethod);
        assert_eq!(session.current_side(), Side::Front);
        assert_eq!(session.images(), &ImageSlots::default());
    }

    #[test]
    fn test_back_from_method_keeps_selection() {
        let mut session = Session::new();
        session.select_country(Country::SG).unwrap();
        session.select_doc_type(DocType::Passport).unwrap();
        session.continue_to_method().unwrap();

        session.back().unwrap();
        assert_eq!(session.step(), Step::Selection);
        assert_eq!(session.country(), Country::SG);
        assert_eq!(session.doc_type(), DocType::Passport);
    }

    #[test]
    fn test_back_from_success_is_retake() {
        let mut session = at_capture(Step::Camera);
        session.capture_image("f1").unwrap();
        session.capture_image("b1").unwrap();

        session.back().unwrap();
        assert_eq!(session.step(), Step::Selection);
        assert_eq!(session.images(), &ImageSlots::default());
    }

    #[test]
    fn test_back_at_selection_rejected() {
        let mut session = Session::new();
        assert!(matches!(
            session.back(),
            Err(FlowError::InvalidStep { operation: "back", .. })
        ));
    }

    #[test]
    fn test_retake_resets_everything() {
        let mut session = Session::new();
        session.select_country(Country::SG).unwrap();
        session.continue_to_method().unwrap();
        session.choose_upload().unwrap();
        session.capture_image("f1").unwrap();

        session.retake();
        assert_eq!(session.step(), Step::Selection);
        assert_eq!(session.country(), Country::CN);
        assert_eq!(session.doc_type(), DocType::NationalId);
        assert_eq!(session.current_side(), Side::Front);
        assert_eq!(session.images(), &ImageSlots::default());
    }

    #[test]
    fn test_confirm_requires_success() {
        let mut session = at_capture(Step::Camera);
        session.capture_image("f1").unwrap();
        let before = session.clone();

        assert!(session.confirm().is_err());
        assert_eq!(session.step(), before.step());
        assert_eq!(session.images(), before.images());
    }

    #[test]
    fn test_confirm_returns_submission_and_resets() {
        let mut session = at_capture(Step::Camera);
        session.capture_image("f1").unwrap();
        session.capture_image("b1").unwrap();

        let submission = session.confirm().unwrap();
        assert_eq!(submission.images.front.as_deref(), Some("f1"));
        assert_eq!(submission.images.back.as_deref(), Some("b1"));
        assert_eq!(session.step(), Step::Selection);
        assert_eq!(session.images(), &ImageSlots::default());
    }

    #[test]
    fn test_capture_outside_capture_step_rejected() {
        let mut session = Session::new();
        assert!(session.capture_image("x").is_err());
        assert_eq!(session.images(), &ImageSlots::default());
    }

    #[test]
    fn test_empty_image_rejected() {
        let mut session = at_capture(Step::Upload);
        assert_eq!(session.capture_image(""), Err(FlowError::EmptyImage));
        assert_eq!(session.current_side(), Side::Front);
        assert_eq!(session.images().front, None);
    }

    #[test]
    fn test_stale_ticket_dropped() {
        let mut session = at_capture(Step::Camera);
        let ticket = session.capture_ticket();
        session.back().unwrap();
        session.choose_camera().unwrap();

        assert!(matches!(
            session.capture_with_ticket(ticket, "late"),
            Err(FlowError::StaleCapture { .. })
        ));
        assert_eq!(session.images().front, None);

        let fresh = session.capture_ticket();
        session.capture_with_ticket(fresh, "f1").unwrap();
        assert_eq!(session.images().front, Some(ImageRef::new("f1")));
    }

    #[test]
    fn test_front_ticket_not_reused_for_back() {
        let mut session = at_capture(Step::Camera);
        let ticket = session.capture_ticket();
        session.capture_with_ticket(ticket, "f1").unwrap();
        assert!(session.capture_with_ticket(ticket, "f1-again").is_err());
        assert_eq!(session.images().back, None);
    }

    #[test]
    fn test_generation_survives_reset() {
        let mut session = at_capture(Step::Camera);
        let before = session.generation();
        session.retake();
        assert!(session.generation() > before);
    }
}

use std::sync::Arc;

use slotkeeper_core::{
    catalog::Bucket,
    model::{Booking, BookingId, BucketKey, Locator, LookupKey, Occupancy, Record},
    plugin::{DeskId, DeskMeta},
    schema::FieldSpec,
    service::ReservationService,
};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    DeskSelect,
    Buckets,
    BookForm,
    Lookup,
    Amend,
}

pub(crate) struct FormField {
    pub spec: FieldSpec,
    pub input: String,
}

pub(crate) struct App {
    pub service: Arc<ReservationService>,

    pub screen: Screen,
    pub desks: Vec<DeskMeta>,
    pub desk_list_index: usize,
    pub selected_desk: Option<DeskMeta>,

    pub buckets: Vec<(Bucket, Occupancy)>,
    pub bucket_list_index: usize,

    pub form_bucket: Option<BucketKey>,
    pub form: Vec<FormField>,
    pub form_index: usize,

    pub lookup_input: String,
    pub found: Option<Booking>,
    pub amend_input: String,

    pub info_message: Option<String>,
    pub error_message: Option<String>,
}

impl App {
    pub(crate) fn new(service: Arc<ReservationService>) -> Self {
        let desks = service.desks();
        Self {
            service,
            screen: Screen::DeskSelect,
            desks,
            desk_list_index: 0,
            selected_desk: None,
            buckets: Vec::new(),
            bucket_list_index: 0,
            form_bucket: None,
            form: Vec::new(),
            form_index: 0,
            lookup_input: String::new(),
            found: None,
            amend_input: String::new(),
            info_message: None,
            error_message: None,
        }
    }

    pub(crate) fn select_current_desk(&mut self) {
        if let Some(meta) = self.desks.get(self.desk_list_index).cloned() {
            self.selected_desk = Some(meta);
            self.bucket_list_index = 0;
            self.found = None;
            self.lookup_input.clear();
            self.refresh_buckets();
            self.screen = Screen::Buckets;
        }
    }

    pub(crate) fn refresh_buckets(&mut self) {
        let Some(desk) = self.desk_id() else {
            return;
        };
        match self.service.occupancy(&desk) {
            Ok(buckets) => self.buckets = buckets,
            Err(err) => self.fail(format!("Could not load buckets: {err}")),
        }
    }

    pub(crate) fn open_form_for_current_bucket(&mut self) {
        let Some(desk) = self.desk_id() else {
            return;
        };
        let Some((bucket_key, occupancy)) = self
            .buckets
            .get(self.bucket_list_index)
            .map(|(bucket, occupancy)| (bucket.key.clone(), *occupancy))
        else {
            return;
        };
        if occupancy.is_full() {
            self.fail(format!("{bucket_key} is full"));
            return;
        }

        match self.service.form(&desk) {
            Ok(specs) => {
                self.form = specs
                    .into_iter()
                    .map(|spec| FormField {
                        spec,
                        input: String::new(),
                    })
                    .collect();
                self.form_index = 0;
                self.form_bucket = Some(bucket_key);
                self.clear_messages();
                self.screen = Screen::BookForm;
            }
            Err(err) => self.fail(format!("Could not open form: {err}")),
        }
    }

    pub(crate) fn current_form_input(&mut self) -> Option<&mut String> {
        self.form
            .get_mut(self.form_index)
            .map(|field| &mut field.input)
    }

    pub(crate) fn submit_booking(&mut self) {
        let (Some(desk), Some(bucket)) = (self.desk_id(), self.form_bucket.clone()) else {
            return;
        };

        let parsed: Result<Record, String> = self
            .form
            .iter()
            .map(|field| {
                field
                    .spec
                    .kind()
                    .parse(&field.input)
                    .map(|value| (field.spec.name().to_owned(), value))
                    .map_err(|reason| format!("{}: {reason}", field.spec.name()))
            })
            .collect();
        let record = match parsed {
            Ok(record) => record,
            Err(message) => {
                self.fail(message);
                return;
            }
        };

        match self.service.book(&desk, &bucket, record) {
            Ok(id) => {
                debug!(desk = %desk, booking_id = %id, "booked from terminal");
                self.succeed(format!("Booked {bucket}, id {id}"));
                self.form.clear();
                self.form_bucket = None;
                self.refresh_buckets();
                self.screen = Screen::Buckets;
            }
            Err(err) => self.fail(format!("Booking failed: {err}")),
        }
    }

    pub(crate) fn lookup(&mut self) {
        let Some(desk) = self.desk_id() else {
            return;
        };
        let needle = self.lookup_input.trim().to_owned();
        if needle.is_empty() {
            let message = format!("Type a {} first", self.lookup_label());
            self.fail(message);
            return;
        }

        // Try the desk's lookup key first, then fall back to a booking id copied from a
        // confirmation message.
        let by_key = Locator::Key(LookupKey(needle.clone()));
        let by_id = Locator::Id(BookingId(needle.clone()));
        let result = self.service.view(&desk, &by_key).and_then(|found| {
            found.map_or_else(|| self.service.view(&desk, &by_id), |booking| Ok(Some(booking)))
        });

        match result {
            Ok(Some(booking)) => {
                self.found = Some(booking);
                self.clear_messages();
            }
            Ok(None) => {
                self.found = None;
                self.fail(format!("Nothing booked under {needle}"));
            }
            Err(err) => self.fail(format!("Lookup failed: {err}")),
        }
    }

    pub(crate) fn cancel_found(&mut self) {
        let (Some(desk), Some(booking)) = (self.desk_id(), self.found.take()) else {
            self.fail("Look up a booking first".to_owned());
            return;
        };

        match self.service.cancel(&desk, &Locator::Id(booking.id.clone())) {
            Ok(true) => {
                self.succeed(format!("Cancelled {}", booking.id));
                self.refresh_buckets();
            }
            Ok(false) => self.fail(format!("{} was already cancelled", booking.id)),
            Err(err) => self.fail(format!("Cancel failed: {err}")),
        }
    }

    pub(crate) fn start_amend(&mut self) {
        if self.found.is_some() {
            self.amend_input.clear();
            self.clear_messages();
            self.screen = Screen::Amend;
        } else {
            self.fail("Look up a booking first".to_owned());
        }
    }

    pub(crate) fn submit_amend(&mut self) {
        let (Some(desk), Some(id)) = (
            self.desk_id(),
            self.found.as_ref().map(|booking| booking.id.clone()),
        ) else {
            return;
        };
        let Some((field, raw)) = self
            .amend_input
            .split_once('=')
            .map(|(field, raw)| (field.trim().to_owned(), raw.to_owned()))
        else {
            self.fail("Use field=value".to_owned());
            return;
        };

        let kind = match self.service.form(&desk) {
            Ok(specs) => specs
                .iter()
                .find(|spec| spec.name() == field)
                .map(FieldSpec::kind),
            Err(err) => {
                self.fail(format!("Amend failed: {err}"));
                return;
            }
        };
        let Some(kind) = kind else {
            self.fail(format!("{field} is not a field of this desk"));
            return;
        };
        let value = match kind.parse(&raw) {
            Ok(value) => value,
            Err(reason) => {
                self.fail(format!("{field}: {reason}"));
                return;
            }
        };

        let locator = Locator::Id(id.clone());
        match self.service.amend(&desk, &locator, &field, value) {
            Ok(true) => {
                self.found = self.service.view(&desk, &locator).ok().flatten();
                self.succeed(format!("Updated {field} on {id}"));
                self.screen = Screen::Lookup;
            }
            Ok(false) => {
                self.found = None;
                self.fail(format!("{id} no longer exists"));
                self.screen = Screen::Lookup;
            }
            Err(err) => self.fail(format!("Amend failed: {err}")),
        }
    }

    pub(crate) fn lookup_label(&self) -> &str {
        self.selected_desk
            .as_ref()
            .map_or("booking id", |desk| desk.lookup_label.as_str())
    }

    pub(crate) fn clear_messages(&mut self) {
        self.info_message = None;
        self.error_message = None;
    }

    fn desk_id(&self) -> Option<DeskId> {
        self.selected_desk.as_ref().map(|desk| desk.id.clone())
    }

    fn succeed(&mut self, message: String) {
        self.error_message = None;
        self.info_message = Some(message);
    }

    fn fail(&mut self, message: String) {
        self.info_message = None;
        self.error_message = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use slotkeeper_core::plugin::{DeskProfile, DeskRegistry};
    use slotkeeper_desk_clinic::{self as clinic, ClinicConfig};
    use slotkeeper_desk_school::{self as school, SchoolConfig};

    use super::*;

    fn app_at(profile: DeskProfile) -> App {
        let registry = DeskRegistry::new(vec![profile]).expect("single desk");
        let mut app = App::new(Arc::new(ReservationService::new(registry)));
        app.select_current_desk();
        app
    }

    fn found_id(app: &App) -> Option<&BookingId> {
        app.found.as_ref().map(|booking| &booking.id)
    }

    #[test]
    fn lookup_tries_key_then_booking_id() {
        let mut app = app_at(clinic::desk(&ClinicConfig::default()).expect("clinic desk"));
        assert_eq!(app.screen, Screen::Buckets);

        let id = app
            .service
            .book(
                &DeskId("clinic".to_owned()),
                &BucketKey::compound("Dr. Shah", "10am"),
                Record::new()
                    .with("name", "Aarav")
                    .with("age", 27_i64)
                    .with("mobile", "9876543210"),
            )
            .expect("room left");

        app.lookup_input = " 9876543210 ".to_owned();
        app.lookup();
        assert_eq!(found_id(&app), Some(&id));

        app.lookup_input = id.to_string();
        app.lookup();
        assert_eq!(found_id(&app), Some(&id));
        assert_eq!(app.error_message, None);

        app.lookup_input = "9000000000".to_owned();
        app.lookup();
        assert_eq!(found_id(&app), None);
        assert_eq!(
            app.error_message.as_deref(),
            Some("Nothing booked under 9000000000")
        );

        app.lookup_input.clear();
        app.lookup();
        assert_eq!(app.error_message.as_deref(), Some("Type a mobile first"));
    }

    #[test]
    fn amend_parses_field_and_value() {
        let mut app = app_at(school::desk(&SchoolConfig::default()).expect("school desk"));
        let id = app
            .service
            .book(
                &DeskId("school".to_owned()),
                &BucketKey::from("admissions"),
                Record::new()
                    .with("name", "Meera")
                    .with("age", 10_i64)
                    .with("std_class", 5_i64)
                    .with("guardian_mobile", "9123456789"),
            )
            .expect("seat left");

        app.lookup_input = id.to_string();
        app.lookup();
        app.start_amend();
        assert_eq!(app.screen, Screen::Amend);

        app.amend_input = "std_class = 7".to_owned();
        app.submit_amend();
        assert_eq!(app.screen, Screen::Lookup);
        assert_eq!(
            app.found.as_ref().and_then(|booking| booking.record.integer("std_class")),
            Some(7)
        );
        assert_eq!(app.info_message, Some(format!("Updated std_class on {id}")));

        app.start_amend();
        for (input, expected) in [
            ("std_class=seven", "std_class: expected a whole number"),
            ("std_class 8", "Use field=value"),
            ("locker=3", "locker is not a field of this desk"),
            ("name=Mira", "Amend failed"),
        ] {
            app.amend_input = input.to_owned();
            app.submit_amend();
            let message = app.error_message.clone().unwrap_or_default();
            assert!(message.starts_with(expected), "{input}: got {message:?}");
        }
        assert_eq!(
            app.found.as_ref().and_then(|booking| booking.record.integer("std_class")),
            Some(7)
        );
    }
}

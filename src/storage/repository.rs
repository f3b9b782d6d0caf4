use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::data::{sample_forms, sample_users};
use crate::models::{Form, FormResponse, User};

use super::{FileStore, KeyValueStore, MemoryStore, StorageError};

pub const USERS_KEY: &str = "users";
pub const FORMS_KEY: &str = "forms";
pub const RESPONSES_KEY: &str = "form_responses";

/// Outcome of [`Storage::record_response`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedResponse {
    Stored { form: Form, response: FormResponse },
    Duplicate,
    FormMissing,
}

/// Typed access to the user, form and response collections.
///
/// Writes go through a single lock so that read-modify-write cycles on a
/// collection never interleave.
pub struct Storage {
    store: Box<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl Storage {
    pub fn new<S: KeyValueStore + 'static>(store: S) -> Self {
        Self {
            store: Box::new(store),
            write_lock: Mutex::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// File-backed storage rooted at `dir`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StorageError> {
        Ok(Self::new(FileStore::open(dir)?))
    }

    /// Seed every collection that has never been written.
    ///
    /// Returns true if anything was seeded.
    pub fn initialize(&self) -> Result<bool, StorageError> {
        let _guard = self.lock();
        let mut seeded = false;

        if self.store.get(USERS_KEY)?.is_none() {
            self.write(USERS_KEY, &sample_users())?;
            seeded = true;
        }
        if self.store.get(FORMS_KEY)?.is_none() {
            self.write(FORMS_KEY, &sample_forms())?;
            seeded = true;
        }
        if self.store.get(RESPONSES_KEY)?.is_none() {
            self.write::<FormResponse>(RESPONSES_KEY, &[])?;
            seeded = true;
        }

        if seeded {
            info!("Seeded storage with sample data");
        }
        Ok(seeded)
    }

    /// Create each collection empty if it is missing, without sample data.
    pub fn initialize_empty(&self) -> Result<(), StorageError> {
        let _guard = self.lock();
        for key in [USERS_KEY, FORMS_KEY, RESPONSES_KEY] {
            if self.store.get(key)?.is_none() {
                self.store.set(key, "[]")?;
            }
        }
        Ok(())
    }

    /// Guards no data, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StorageError> {
        match self.store.get(key)? {
            Some(json) => serde_json::from_str(&json).map_err(|source| StorageError::Corrupt {
                key: key.to_string(),
                source,
            }),
            None => Ok(Vec::new()),
        }
    }

    fn write<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), StorageError> {
        let json = serde_json::to_string(items).map_err(|source| StorageError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, &json)
    }

    /// Read-modify-write a collection. Nothing is written if `f` fails.
    fn try_update<T, R, E>(
        &self,
        key: &str,
        f: impl FnOnce(&mut Vec<T>) -> Result<R, E>,
    ) -> Result<R, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<StorageError>,
    {
        let _guard = self.lock();
        let mut items = self.read(key)?;
        let result = f(&mut items)?;
        self.write(key, &items)?;
        Ok(result)
    }

    fn update<T, R>(&self, key: &str, f: impl FnOnce(&mut Vec<T>) -> R) -> Result<R, StorageError>
    where
        T: Serialize + DeserializeOwned,
    {
        self.try_update(key, |items| Ok::<_, StorageError>(f(items)))
    }

    // Users

    pub fn users(&self) -> Result<Vec<User>, StorageError> {
        self.read(USERS_KEY)
    }

    /// Append a user unless the username is taken. Returns false if taken.
    pub fn save_user(&self, user: User) -> Result<bool, StorageError> {
        self.update(USERS_KEY, |users: &mut Vec<User>| {
            if users.iter().any(|u| u.username == user.username) {
                false
            } else {
                users.push(user);
                true
            }
        })
    }

    pub fn user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        Ok(self.users()?.into_iter().find(|u| u.username == username))
    }

    pub fn user_by_id(&self, id: &str) -> Result<Option<User>, StorageError> {
        Ok(self.users()?.into_iter().find(|u| u.id == id))
    }

    // Forms

    pub fn forms(&self) -> Result<Vec<Form>, StorageError> {
        self.read(FORMS_KEY)
    }

    pub fn form_by_id(&self, id: &str) -> Result<Option<Form>, StorageError> {
        Ok(self.forms()?.into_iter().find(|f| f.id == id))
    }

    pub fn forms_by_subject(&self, subject: &str) -> Result<Vec<Form>, StorageError> {
        Ok(self
            .forms()?
            .into_iter()
            .filter(|f| f.subject == subject)
            .collect())
    }

    pub fn forms_by_teacher(&self, teacher_id: &str) -> Result<Vec<Form>, StorageError> {
        Ok(self
            .forms()?
            .into_iter()
            .filter(|f| f.created_by == teacher_id)
            .collect())
    }

    /// Insert or replace a form by id.
    pub fn save_form(&self, form: Form) -> Result<(), StorageError> {
        self.update(FORMS_KEY, |forms: &mut Vec<Form>| {
            match forms.iter_mut().find(|f| f.id == form.id) {
                Some(existing) => *existing = form,
                None => forms.push(form),
            }
        })
    }

    /// Apply `f` to a stored form and persist the result.
    ///
    /// Returns `Ok(None)` when no form has that id. Nothing is written if `f`
    /// fails.
    pub fn modify_form<R, E>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Form) -> Result<R, E>,
    ) -> Result<Option<R>, E>
    where
        E: From<StorageError>,
    {
        self.try_update(FORMS_KEY, |forms: &mut Vec<Form>| {
            match forms.iter_mut().find(|form| form.id == id) {
                Some(form) => f(form).map(Some),
                None => Ok(None),
            }
        })
    }

    /// Returns false if no form had that id.
    pub fn delete_form(&self, id: &str) -> Result<bool, StorageError> {
        self.update(FORMS_KEY, |forms: &mut Vec<Form>| {
            let before = forms.len();
            forms.retain(|f| f.id != id);
            forms.len() != before
        })
    }

    /// Delete a form together with its responses.
    ///
    /// Returns how many responses went with it, or `None` if no form had
    /// that id.
    pub fn delete_form_with_responses(&self, id: &str) -> Result<Option<usize>, StorageError> {
        let _guard = self.lock();
        let mut forms: Vec<Form> = self.read(FORMS_KEY)?;
        let before = forms.len();
        forms.retain(|f| f.id != id);
        if forms.len() == before {
            return Ok(None);
        }

        let mut responses: Vec<FormResponse> = self.read(RESPONSES_KEY)?;
        let answered = responses.len();
        responses.retain(|r| r.form_id != id);

        self.write(FORMS_KEY, &forms)?;
        self.write(RESPONSES_KEY, &responses)?;
        Ok(Some(answered - responses.len()))
    }

    // Responses

    pub fn responses(&self) -> Result<Vec<FormResponse>, StorageError> {
        self.read(RESPONSES_KEY)
    }

    pub fn responses_by_form(&self, form_id: &str) -> Result<Vec<FormResponse>, StorageError> {
        Ok(self
            .responses()?
            .into_iter()
            .filter(|r| r.form_id == form_id)
            .collect())
    }

    pub fn responses_by_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<FormResponse>, StorageError> {
        Ok(self
            .responses()?
            .into_iter()
            .filter(|r| r.student_id == student_id)
            .collect())
    }

    pub fn student_response_to_form(
        &self,
        form_id: &str,
        student_id: &str,
    ) -> Result<Option<FormResponse>, StorageError> {
        Ok(self
            .responses()?
            .into_iter()
            .find(|r| r.form_id == form_id && r.student_id == student_id))
    }

    /// Insert or replace a response by id.
    pub fn save_response(&self, response: FormResponse) -> Result<(), StorageError> {
        self.update(RESPONSES_KEY, |responses: &mut Vec<FormResponse>| {
            match responses.iter_mut().find(|r| r.id == response.id) {
                Some(existing) => *existing = response,
                None => responses.push(response),
            }
        })
    }

    /// Build and store a student's first response to a form.
    ///
    /// The form lookup, the duplicate check and the insert all happen under
    /// the write lock, so `build` always sees the form as currently stored.
    pub fn record_response<E>(
        &self,
        form_id: &str,
        student_id: &str,
        build: impl FnOnce(&Form) -> Result<FormResponse, E>,
    ) -> Result<RecordedResponse, E>
    where
        E: From<StorageError>,
    {
        let _guard = self.lock();
        let forms: Vec<Form> = self.read(FORMS_KEY)?;
        let Some(form) = forms.into_iter().find(|f| f.id == form_id) else {
            return Ok(RecordedResponse::FormMissing);
        };

        let mut responses: Vec<FormResponse> = self.read(RESPONSES_KEY)?;
        if responses
            .iter()
            .any(|r| r.form_id == form_id && r.student_id == student_id)
        {
            return Ok(RecordedResponse::Duplicate);
        }

        let response = build(&form)?;
        responses.push(response.clone());
        self.write(RESPONSES_KEY, &responses)?;
        Ok(RecordedResponse::Stored { form, response })
    }

    /// Returns the number of responses removed.
    pub fn delete_responses_for_form(&self, form_id: &str) -> Result<usize, StorageError> {
        self.update(RESPONSES_KEY, |responses: &mut Vec<FormResponse>| {
            let before = responses.len();
            responses.retain(|r| r.form_id != form_id);
            before - responses.len()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Question, Role};

    fn form(id: &str, subject: &str, teacher: &str) -> Form {
        Form {
            id: id.to_string(),
            title: format!("Form {}", id),
            subject: subject.to_string(),
            created_by: teacher.to_string(),
            questions: vec![Question {
                id: "1".into(),
                text: "Pick one".into(),
                options: vec!["a".into(), "b".into()],
                correct_answer: 1,
            }],
        }
    }

    #[test]
    fn test_initialize_seeds_once() {
        let storage = Storage::in_memory();
        assert!(storage.initialize().unwrap());
        assert!(!storage.initialize().unwrap());

        assert_eq!(storage.users().unwrap().len(), 2);
        assert_eq!(storage.forms().unwrap().len(), 3);
        assert!(storage.responses().unwrap().is_empty());
    }

    #[test]
    fn test_initialize_keeps_existing_data() {
        let storage = Storage::in_memory();
        storage.initialize_empty().unwrap();
        storage.save_form(form("mine", "1", "t")).unwrap();

        storage.initialize().unwrap();
        let forms = storage.forms().unwrap();
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].id, "mine");
    }

    #[test]
    fn test_missing_collection_reads_empty() {
        let storage = Storage::in_memory();
        assert!(storage.forms().unwrap().is_empty());
        assert!(storage.user_by_id("nobody").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_collection_is_an_error() {
        let store = MemoryStore::new();
        store.set(FORMS_KEY, "{not json").unwrap();
        let storage = Storage::new(store);

        match storage.forms() {
            Err(StorageError::Corrupt { key, .. }) => assert_eq!(key, FORMS_KEY),
            other => panic!("expected corrupt error, got {:?}", other),
        }
    }

    #[test]
    fn test_save_user_rejects_duplicate_username() {
        let storage = Storage::in_memory();
        let alice = User::new("alice", "pw", Role::Student, vec![]);
        assert!(storage.save_user(alice.clone()).unwrap());
        assert!(!storage
            .save_user(User::new("alice", "other", Role::Teacher, vec![]))
            .unwrap());

        assert_eq!(storage.users().unwrap().len(), 1);
        assert_eq!(
            storage.user_by_username("alice").unwrap().map(|u| u.id),
            Some(alice.id)
        );
    }

    #[test]
    fn test_form_queries_and_upsert() {
        let storage = Storage::in_memory();
        storage.save_form(form("a", "1", "t1")).unwrap();
        storage.save_form(form("b", "2", "t1")).unwrap();
        storage.save_form(form("c", "1", "t2")).unwrap();

        assert_eq!(storage.forms_by_subject("1").unwrap().len(), 2);
        assert_eq!(storage.forms_by_teacher("t1").unwrap().len(), 2);

        let mut renamed = form("a", "1", "t1");
        renamed.title = "Renamed".into();
        storage.save_form(renamed).unwrap();
        assert_eq!(storage.forms().unwrap().len(), 3);
        assert_eq!(storage.form_by_id("a").unwrap().unwrap().title, "Renamed");

        assert!(storage.delete_form("a").unwrap());
        assert!(!storage.delete_form("a").unwrap());
    }

    #[test]
    fn test_modify_form_writes_only_on_success() {
        let storage = Storage::in_memory();
        storage.save_form(form("a", "1", "t1")).unwrap();

        let failed: Result<Option<()>, crate::Error> = storage.modify_form("a", |f| {
            f.title = "Changed".into();
            Err(crate::Error::AlreadySubmitted)
        });
        assert!(failed.is_err());
        assert_eq!(storage.form_by_id("a").unwrap().unwrap().title, "Form a");

        let missing: Result<Option<()>, StorageError> = storage.modify_form("zz", |_| Ok(()));
        assert!(missing.unwrap().is_none());

        let ok: Result<Option<usize>, StorageError> = storage.modify_form("a", |f| {
            f.title = "Changed".into();
            Ok(f.questions.len())
        });
        assert_eq!(ok.unwrap(), Some(1));
        assert_eq!(storage.form_by_id("a").unwrap().unwrap().title, "Changed");
    }

    #[test]
    fn test_responses() {
        let storage = Storage::in_memory();
        storage.save_form(form("f1", "1", "t1")).unwrap();

        let first = FormResponse::new("f1", "s1", vec![1], 100.0);
        let stored: Result<_, StorageError> =
            storage.record_response("f1", "s1", |_| Ok(first.clone()));
        assert!(matches!(stored.unwrap(), RecordedResponse::Stored { .. }));

        let again: Result<_, StorageError> = storage.record_response("f1", "s1", |_| {
            Ok(FormResponse::new("f1", "s1", vec![0], 0.0))
        });
        assert_eq!(again.unwrap(), RecordedResponse::Duplicate);

        let missing: Result<_, StorageError> = storage.record_response("gone", "s1", |_| {
            Ok(FormResponse::new("gone", "s1", vec![0], 0.0))
        });
        assert_eq!(missing.unwrap(), RecordedResponse::FormMissing);

        storage
            .save_response(FormResponse::new("f2", "s1", vec![0], 0.0))
            .unwrap();
        storage
            .save_response(FormResponse::new("f1", "s2", vec![0], 0.0))
            .unwrap();

        assert_eq!(storage.responses_by_form("f1").unwrap().len(), 2);
        assert_eq!(storage.responses_by_student("s1").unwrap().len(), 2);
        assert_eq!(
            storage.student_response_to_form("f1", "s1").unwrap(),
            Some(first)
        );

        assert_eq!(storage.delete_responses_for_form("f1").unwrap(), 2);
        assert_eq!(storage.responses().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_form_with_responses() {
        let storage = Storage::in_memory();
        storage.save_form(form("a", "1", "t1")).unwrap();
        storage.save_form(form("b", "1", "t1")).unwrap();
        storage
            .save_response(FormResponse::new("a", "s1", vec![0], 0.0))
            .unwrap();
        storage
            .save_response(FormResponse::new("b", "s1", vec![0], 0.0))
            .unwrap();

        assert_eq!(storage.delete_form_with_responses("a").unwrap(), Some(1));
        assert_eq!(storage.delete_form_with_responses("a").unwrap(), None);
        assert_eq!(storage.forms().unwrap().len(), 1);
        assert_eq!(storage.responses_by_form("b").unwrap().len(), 1);
    }

    #[test]
    fn test_panic_while_writing_does_not_block_later_writes() {
        use std::panic::{self, AssertUnwindSafe};

        let storage = Storage::in_memory();
        storage.save_form(form("a", "1", "t1")).unwrap();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _: Result<Option<()>, StorageError> =
                storage.modify_form("a", |_| panic!("boom"));
        }));
        assert!(result.is_err());

        storage.save_form(form("b", "1", "t1")).unwrap();
        assert_eq!(storage.forms().unwrap().len(), 2);
    }
}

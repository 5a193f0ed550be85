//! Background writer for native saves
//!
//! Writes are handed to a worker thread so the tick loop never waits on
//! disk. Consecutive writes of the same key set are coalesced: only the
//! newest one reaches the inner store. Reads flush pending writes first,
//! so a read always observes every earlier write.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use super::{PersistError, SaveStore};

type Items = Vec<(String, String)>;

enum Command {
    Write(Items),
    Remove(Vec<String>),
    Flush(Sender<()>),
}

pub struct BackgroundStore<S: SaveStore + Send + 'static> {
    inner: Arc<Mutex<S>>,
    sender: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
}

impl<S: SaveStore + Send + 'static> BackgroundStore<S> {
    pub fn new(store: S) -> Self {
        let inner = Arc::new(Mutex::new(store));
        let (sender, receiver) = mpsc::channel();
        let worker_inner = Arc::clone(&inner);
        let worker = thread::Builder::new()
            .name("wayfarer-save".into())
            .spawn(move || run_worker(worker_inner, receiver));

        match worker {
            Ok(handle) => Self {
                inner,
                sender: Some(sender),
                worker: Some(handle),
            },
            Err(e) => {
                // Without a worker every call goes straight to the store
                log::warn!("Could not start save thread, saving inline: {}", e);
                Self {
                    inner,
                    sender: None,
                    worker: None,
                }
            }
        }
    }

    /// Block until every queued write has reached the inner store
    pub fn flush(&self) -> Result<(), PersistError> {
        let Some(sender) = &self.sender else {
            return Ok(());
        };
        let (ack_tx, ack_rx) = mpsc::channel();
        sender
            .send(Command::Flush(ack_tx))
            .map_err(|_| PersistError::WriterStopped)?;
        ack_rx.recv().map_err(|_| PersistError::WriterStopped)
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut S) -> Result<T, PersistError>) -> Result<T, PersistError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| PersistError::Backend("save store lock poisoned".into()))?;
        f(&mut guard)
    }
}

impl<S: SaveStore + Send + 'static> SaveStore for BackgroundStore<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistError> {
        self.flush()?;
        self.with_inner(|store| store.get_item(key))
    }

    fn set_items(&mut self, items: &[(&str, String)]) -> Result<(), PersistError> {
        let Some(sender) = &self.sender else {
            return self.with_inner(|store| store.set_items(items));
        };
        let owned = items
            .iter()
            .map(|(key, value)| ((*key).to_string(), value.clone()))
            .collect();
        sender
            .send(Command::Write(owned))
            .map_err(|_| PersistError::WriterStopped)
    }

    fn remove_items(&mut self, keys: &[&str]) -> Result<(), PersistError> {
        let Some(sender) = &self.sender else {
            return self.with_inner(|store| store.remove_items(keys));
        };
        let owned = keys.iter().map(|key| (*key).to_string()).collect();
        sender
            .send(Command::Remove(owned))
            .map_err(|_| PersistError::WriterStopped)
    }
}

impl<S: SaveStore + Send + 'static> Drop for BackgroundStore<S> {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Save thread panicked");
            }
        }
    }
}

fn run_worker<S: SaveStore>(inner: Arc<Mutex<S>>, receiver: Receiver<Command>) {
    while let Ok(first) = receiver.recv() {
        let mut batch = vec![first];
        while let Ok(next) = receiver.try_recv() {
            batch.push(next);
        }
        apply_batch(&inner, batch);
    }
    log::debug!("Save thread exiting");
}

fn same_keys(a: &Items, b: &Items) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|((ka, _), (kb, _))| ka == kb)
}

fn apply_batch<S: SaveStore>(inner: &Mutex<S>, batch: Vec<Command>) {
    let mut pending: Option<Items> = None;

    for command in batch {
        match command {
            Command::Write(items) => {
                match pending.take() {
                    Some(prev) if same_keys(&prev, &items) => {
                        log::trace!("Coalesced save of {} keys", items.len());
                    }
                    Some(prev) => write_items(inner, &prev),
                    None => {}
                }
                pending = Some(items);
            }
            Command::Remove(keys) => {
                if let Some(prev) = pending.take() {
                    write_items(inner, &prev);
                }
                let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
                with_store(inner, |store| store.remove_items(&keys));
            }
            Command::Flush(ack) => {
                if let Some(prev) = pending.take() {
                    write_items(inner, &prev);
                }
                let _ = ack.send(());
            }
        }
    }

    if let Some(prev) = pending {
        write_items(inner, &prev);
    }
}

fn write_items<S: SaveStore>(inner: &Mutex<S>, items: &Items) {
    let borrowed: Vec<(&str, String)> = items
        .iter()
        .map(|(key, value)| (key.as_str(), value.clone()))
        .collect();
    with_store(inner, |store| store.set_items(&borrowed));
}

fn with_store<S: SaveStore>(inner: &Mutex<S>, f: impl FnOnce(&mut S) -> Result<(), PersistError>) {
    match inner.lock() {
        Ok(mut store) => {
            if let Err(e) = f(&mut store) {
                log::warn!("Background save failed: {}", e);
            }
        }
        Err(_) => log::error!("Save store lock poisoned, dropping write"),
    }
}

mod concurrency;
mod notes;

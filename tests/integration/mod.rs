mod helpers;
mod test_digest;
mod test_init;
mod test_release;

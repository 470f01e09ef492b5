use super::test_helpers::*;
use super::*;
use crate::types::{DownloadRequest, DownloadStatus};
use std::sync::Arc;
use std::time::Duration;

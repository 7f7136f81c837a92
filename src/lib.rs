// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod audit;
pub mod cli;
pub mod commands;
pub mod db;
pub mod error;
pub mod goals;
pub mod ledger;
pub mod mapping;
pub mod models;
pub mod recommend;
pub mod reconcile;
pub mod store;
pub mod utils;
pub mod validate;

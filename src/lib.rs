pub mod alignment;
pub mod clustering;
pub mod embedding;
pub mod labeling;
pub mod loading;
pub mod models;
pub mod normalization;
pub mod output;
pub mod pipeline;
pub mod utils;

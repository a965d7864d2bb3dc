/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Scoreboard operations on the shared match.
pub mod match_service;
/// Restoring and saving the match document.
pub mod persistence;
/// Roster and slot assignment operations.
pub mod player_service;
/// Score-sheet projections of the live and archived sets.
pub mod sheet_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Background re-save after storage failures.
pub mod storage_supervisor;

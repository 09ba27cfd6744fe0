mod concurrent_registration;
mod disconnect_blip;
mod election_case1;
mod graceful_shutdown;
mod single_candidate;

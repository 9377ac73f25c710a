mod test_candidate_queueing;
mod test_initiator_tie_break;
mod test_no_duplicate_links;
mod test_unknown_identity_dropped;

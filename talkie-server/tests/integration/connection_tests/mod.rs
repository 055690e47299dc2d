mod test_abrupt_disconnect_and_rejoin;
mod test_duplicate_join_replaces_handle;
mod test_join_reports_room_sizes;
mod test_protocol_errors_keep_connection_open;

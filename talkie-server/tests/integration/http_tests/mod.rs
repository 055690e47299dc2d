mod test_rooms_debug_api;

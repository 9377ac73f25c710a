mod test_switch_profile;

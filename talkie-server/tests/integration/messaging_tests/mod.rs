mod test_offer_answer_exchange;
mod test_third_joiner_still_routed;

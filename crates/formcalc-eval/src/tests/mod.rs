mod coercion;
